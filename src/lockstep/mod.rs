//! Lockstep traversal and comparison
//!
//! N agents walk their trees in lockstep, one entry per round, so the
//! comparator can check agreement without buffering either tree.
//!
//! # Architecture
//!
//! ```text
//!  ┌─────────┐      ┌─────────┐            ┌─────────┐
//!  │ Agent 0 │      │ Agent 1 │    ...     │ Agent N │
//!  └────┬────┘      └────┬────┘            └────┬────┘
//!       │ acquire gate,  │ publish entry        │
//!       ▼                ▼                      ▼
//!  ┌───────────────────────────────────────────────────┐
//!  │           arrival channel (bounded N)             │
//!  └─────────────────────────┬─────────────────────────┘
//!                            │ one arrival per live
//!                            ▼ agent per round
//!                  ┌───────────────────┐
//!                  │    Comparator     │──► releases every
//!                  │ (calling thread)  │    gate, or terminates
//!                  └───────────────────┘
//! ```

pub mod agent;
pub mod comparator;
pub mod fabric;

pub use agent::{aggregate_stats, Agent, AgentStats};
pub use comparator::{CompareCoordinator, CompareProgress, CompareReport, Mismatch, Outcome};
pub use fabric::{AgentPort, Arrival, ArrivalEvent, ComparePort, FabricStats, RoundFabric};
