//! Round fabric: per-agent gates plus the shared arrival channel
//!
//! The fabric carries the lockstep protocol. Each agent owns a capacity-1
//! gate of unit tokens; the comparator is the only party that puts tokens
//! in, the agent the only one that takes them out. Every publication an
//! agent makes, whether an entry or its final completion marker, spends
//! exactly one token, so an agent can never get a round ahead of the
//! comparator.
//!
//! Gates are pre-seeded with one token so the first round starts without
//! an explicit release. Arrivals from all agents funnel into one bounded
//! channel that the comparator drains once per live agent per round.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One event published by an agent
#[derive(Debug, Clone)]
pub struct Arrival {
    /// Index of the publishing agent
    pub agent: usize,

    /// What arrived
    pub event: ArrivalEvent,
}

/// Payload of an arrival
#[derive(Debug, Clone)]
pub enum ArrivalEvent {
    /// Full path of the entry the agent just visited
    Entry(PathBuf),

    /// The agent's traversal is over; it sends nothing further
    Finished,
}

impl Arrival {
    /// Create an entry arrival
    pub fn entry(agent: usize, path: PathBuf) -> Self {
        Self {
            agent,
            event: ArrivalEvent::Entry(path),
        }
    }

    /// Create a completion marker
    pub fn finished(agent: usize) -> Self {
        Self {
            agent,
            event: ArrivalEvent::Finished,
        }
    }
}

/// Statistics for the round fabric
#[derive(Debug, Default)]
pub struct FabricStats {
    /// Entry arrivals published by agents
    pub entries_published: AtomicU64,

    /// All arrivals sent (entries plus completion markers)
    pub arrivals_sent: AtomicU64,

    /// Arrivals consumed by the comparator
    pub arrivals_drained: AtomicU64,

    /// Gate tokens granted (including the pre-seeded ones)
    pub releases: AtomicU64,

    /// Rounds the comparator has opened
    pub rounds: AtomicU64,
}

impl FabricStats {
    fn record_entry_sent(&self) {
        self.entries_published.fetch_add(1, Ordering::Relaxed);
        self.arrivals_sent.fetch_add(1, Ordering::Relaxed);
    }

    fn record_marker_sent(&self) {
        self.arrivals_sent.fetch_add(1, Ordering::Relaxed);
    }

    fn record_drain(&self) {
        self.arrivals_drained.fetch_add(1, Ordering::Relaxed);
    }

    fn record_release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the start of a comparison round
    pub fn record_round(&self) {
        self.rounds.fetch_add(1, Ordering::Relaxed);
    }

    /// Entry arrivals published so far
    pub fn entries(&self) -> u64 {
        self.entries_published.load(Ordering::Relaxed)
    }

    /// All arrivals sent so far
    pub fn sent(&self) -> u64 {
        self.arrivals_sent.load(Ordering::Relaxed)
    }

    /// Arrivals consumed so far
    pub fn drained(&self) -> u64 {
        self.arrivals_drained.load(Ordering::Relaxed)
    }

    /// Gate tokens granted so far
    pub fn released(&self) -> u64 {
        self.releases.load(Ordering::Relaxed)
    }

    /// Rounds opened so far
    pub fn rounds(&self) -> u64 {
        self.rounds.load(Ordering::Relaxed)
    }
}

/// The synchronization fabric for one comparison run
pub struct RoundFabric {
    compare: ComparePort,
    agents: Vec<AgentPort>,
    stats: Arc<FabricStats>,
}

impl RoundFabric {
    /// Create a fabric for `agent_count` agents
    ///
    /// Every gate starts with one token so the first publication needs no
    /// explicit release; the seed counts as a release in the stats.
    pub fn new(agent_count: usize) -> Self {
        let stats = Arc::new(FabricStats::default());
        let (arrival_tx, arrival_rx) = bounded(agent_count.max(1));

        let mut gates = Vec::with_capacity(agent_count);
        let mut agents = Vec::with_capacity(agent_count);

        for agent in 0..agent_count {
            let (gate_tx, gate_rx) = bounded(1);

            // Pre-seed: the receiver is still local, so this cannot fail
            let _ = gate_tx.try_send(());
            stats.record_release();

            agents.push(AgentPort {
                agent,
                gate: gate_rx,
                arrivals: arrival_tx.clone(),
                stats: Arc::clone(&stats),
            });
            gates.push(gate_tx);
        }

        // The comparator must not hold an arrival sender: disconnection of
        // the channel is how it learns that every agent is gone.
        drop(arrival_tx);

        let compare = ComparePort {
            arrivals: arrival_rx,
            gates,
            stats: Arc::clone(&stats),
        };

        Self {
            compare,
            agents,
            stats,
        }
    }

    /// Number of agent ports
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Get the fabric statistics
    pub fn stats(&self) -> Arc<FabricStats> {
        Arc::clone(&self.stats)
    }

    /// Split into the comparator's port and one port per agent
    pub fn split(self) -> (ComparePort, Vec<AgentPort>) {
        (self.compare, self.agents)
    }
}

/// An agent's side of the fabric
pub struct AgentPort {
    agent: usize,
    gate: Receiver<()>,
    arrivals: Sender<Arrival>,
    stats: Arc<FabricStats>,
}

impl AgentPort {
    /// Index of the agent this port belongs to
    pub fn agent(&self) -> usize {
        self.agent
    }

    /// Block until the comparator releases this agent's gate
    ///
    /// Returns `Err` if the comparator side is gone.
    pub fn acquire(&self) -> Result<(), ()> {
        self.gate.recv().map_err(|_| ())
    }

    /// Publish the full path of a visited entry
    ///
    /// Must be preceded by a successful `acquire`.
    pub fn publish(&self, path: PathBuf) -> Result<(), ()> {
        self.arrivals
            .send(Arrival::entry(self.agent, path))
            .map_err(|_| ())?;
        self.stats.record_entry_sent();
        Ok(())
    }

    /// Publish the completion marker
    ///
    /// Must be preceded by a successful `acquire`, like every publication.
    pub fn finish(&self) -> Result<(), ()> {
        self.arrivals
            .send(Arrival::finished(self.agent))
            .map_err(|_| ())?;
        self.stats.record_marker_sent();
        Ok(())
    }
}

/// The comparator's side of the fabric
pub struct ComparePort {
    arrivals: Receiver<Arrival>,
    gates: Vec<Sender<()>>,
    stats: Arc<FabricStats>,
}

impl ComparePort {
    /// Number of agents wired into the fabric
    pub fn agent_count(&self) -> usize {
        self.gates.len()
    }

    /// Receive one arrival, waiting at most `timeout`
    ///
    /// Returns `Ok(Some(..))` on an arrival, `Ok(None)` on timeout and
    /// `Err` once every agent port has been dropped.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Arrival>, ()> {
        match self.arrivals.recv_timeout(timeout) {
            Ok(arrival) => {
                self.stats.record_drain();
                Ok(Some(arrival))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(()),
        }
    }

    /// Put a token in an agent's gate, blocking if it is full
    ///
    /// Returns `Err` if the agent's port is gone.
    pub fn release(&self, agent: usize) -> Result<(), ()> {
        self.gates[agent].send(()).map_err(|_| ())?;
        self.stats.record_release();
        Ok(())
    }

    /// Try to put a token in an agent's gate without blocking
    ///
    /// Returns `Ok(true)` if a token was granted
    /// Returns `Ok(false)` if a token is already waiting
    /// Returns `Err` if the agent's port is gone
    pub fn try_release(&self, agent: usize) -> Result<bool, ()> {
        match self.gates[agent].try_send(()) {
            Ok(()) => {
                self.stats.record_release();
                Ok(true)
            }
            Err(TrySendError::Full(_)) => Ok(false),
            Err(TrySendError::Disconnected(_)) => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_seeded_gate_allows_first_publish() {
        let fabric = RoundFabric::new(1);
        let (compare, agents) = fabric.split();
        let port = &agents[0];

        // The pre-seeded token is already there
        port.acquire().unwrap();
        port.publish(PathBuf::from("/t/x")).unwrap();

        let arrival = compare
            .recv_timeout(Duration::from_secs(1))
            .unwrap()
            .unwrap();
        assert_eq!(arrival.agent, 0);
        match arrival.event {
            ArrivalEvent::Entry(p) => assert_eq!(p, Path::new("/t/x")),
            ArrivalEvent::Finished => panic!("expected entry"),
        }
    }

    #[test]
    fn test_gate_capacity_is_one() {
        let fabric = RoundFabric::new(1);
        let (compare, _agents) = fabric.split();

        // Seed token still in the gate
        assert!(!compare.try_release(0).unwrap());
    }

    #[test]
    fn test_release_round_trip() {
        let fabric = RoundFabric::new(2);
        let stats = fabric.stats();
        let (compare, agents) = fabric.split();

        for port in &agents {
            port.acquire().unwrap();
            port.publish(PathBuf::from("/r/e")).unwrap();
        }
        for _ in 0..2 {
            compare.recv_timeout(Duration::from_secs(1)).unwrap().unwrap();
        }
        for id in 0..2 {
            compare.release(id).unwrap();
        }
        for port in &agents {
            port.acquire().unwrap();
            port.finish().unwrap();
        }
        for _ in 0..2 {
            compare.recv_timeout(Duration::from_secs(1)).unwrap().unwrap();
        }

        assert_eq!(stats.sent(), 4);
        assert_eq!(stats.drained(), 4);
        assert_eq!(stats.entries(), 2);
        // 2 seeds + 2 explicit releases
        assert_eq!(stats.released(), 4);
    }

    #[test]
    fn test_disconnect_detection() {
        let fabric = RoundFabric::new(1);
        let (compare, agents) = fabric.split();

        drop(agents);
        assert!(compare.recv_timeout(Duration::from_millis(10)).is_err());
        assert!(compare.try_release(0).is_err());
    }

    #[test]
    fn test_agent_sees_comparator_gone() {
        let fabric = RoundFabric::new(1);
        let (compare, agents) = fabric.split();
        let port = &agents[0];

        port.acquire().unwrap();
        drop(compare);

        // Gate is empty and the sender side is gone
        assert!(port.acquire().is_err());
        assert!(port.publish(PathBuf::from("/x")).is_err());
    }
}
