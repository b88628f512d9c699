//! treesame - Lockstep Directory Tree Comparator
//!
//! A tool for deciding whether N directory trees are structurally
//! identical. One traversal agent walks each tree depth-first while a
//! central comparator holds every agent to the same pace, so a
//! divergence is detected at the first differing entry rather than
//! after full scans.
//!
//! # Features
//!
//! - **Lockstep Traversal**: All agents advance one entry per round.
//!   No agent runs ahead, so memory stays bounded regardless of tree
//!   size and mismatches surface as early as possible.
//!
//! - **Round-Based Comparison**: The comparator drains exactly one
//!   arrival per live agent per round and compares root-relative
//!   paths, so trees mounted at different absolute locations compare
//!   equal.
//!
//! - **Early Termination**: The first content or shape mismatch stops
//!   the run. A coordinated shutdown releases every blocked agent
//!   before the verdict is reported.
//!
//! - **Pluggable Listing**: Directory enumeration goes through a
//!   trait, so tests drive the full protocol over in-memory trees.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐            ┌──────────┐
//! │  Root 0  │   │  Root 1  │    ...     │  Root N  │
//! └────┬─────┘   └────┬─────┘            └────┬─────┘
//!      │              │                       │
//!      ▼              ▼                       ▼
//! ┌──────────┐   ┌──────────┐            ┌──────────┐
//! │ Agent 0  │   │ Agent 1  │    ...     │ Agent N  │
//! │  (walk)  │   │  (walk)  │            │  (walk)  │
//! └────┬─────┘   └────┬─────┘            └────┬─────┘
//!      │              │                       │
//!      │   acquire gate, publish arrival      │
//!      └──────────────┼───────────────────────┘
//!                     ▼
//!        ┌──────────────────────────┐
//!        │     Arrival Channel      │
//!        │   (crossbeam bounded)    │
//!        └────────────┬─────────────┘
//!                     ▼
//!        ┌──────────────────────────┐
//!        │        Comparator        │
//!        │  - one drain per agent   │
//!        │  - compare rel. paths    │
//!        │  - release gates         │
//!        └────────────┬─────────────┘
//!                     ▼
//!          ┌────────────────────┐
//!          │      Verdict       │
//!          │ equal / different  │
//!          └────────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Compare two trees
//! treesame /mnt/primary /mnt/replica
//!
//! # Three-way compare, ignoring VCS metadata
//! treesame --exclude '\.git' /srv/a /srv/b /srv/c
//!
//! # Use the exit code in scripts
//! treesame -q /backup/monday /backup/tuesday && echo "in sync"
//! ```

pub mod config;
pub mod error;
pub mod listing;
pub mod lockstep;
pub mod progress;

pub use config::{CliArgs, CompareConfig};
pub use error::{AgentError, CompareError, ConfigError, Result};
pub use listing::{ChildEntry, DirLister, EntryKind, OsLister, StaticLister};
pub use lockstep::{CompareCoordinator, CompareProgress, CompareReport, Mismatch, Outcome};
