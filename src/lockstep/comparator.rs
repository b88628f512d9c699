//! Compare coordinator - drives the lockstep rounds
//!
//! The coordinator is responsible for:
//! - Building the fabric and spawning one agent per root
//! - Draining exactly one arrival per live agent per round
//! - Comparing the round's root-relative paths and deciding the verdict
//! - Coordinated shutdown (mismatch or interrupt) without deadlock
//! - Final statistics and agent joins
//!
//! It runs on the calling thread; only the agents are spawned.

use crate::config::CompareConfig;
use crate::error::{CompareError, Result};
use crate::listing::{DirLister, OsLister};
use crate::lockstep::agent::{aggregate_stats, Agent};
use crate::lockstep::fabric::{
    AgentPort, Arrival, ArrivalEvent, ComparePort, FabricStats, RoundFabric,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often blocking fabric reads wake up to check the terminate flag
const RECV_TICK: Duration = Duration::from_millis(50);

/// Verdict of a comparison run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every tree exposed the same entry sequence
    Equal,

    /// A content or shape mismatch was found
    Different,

    /// An external interrupt ended the run early
    Interrupted,
}

impl Outcome {
    /// Returns true if the trees were found identical
    pub fn is_equal(&self) -> bool {
        matches!(self, Outcome::Equal)
    }

    /// Returns true if the run was cut short before a verdict
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Outcome::Interrupted)
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Equal => 0,
            Outcome::Different => 1,
            Outcome::Interrupted => 130,
        }
    }
}

/// The first divergence found between the trees
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// Two live agents published different root-relative paths
    Entry {
        round: u64,
        baseline_agent: usize,
        baseline: PathBuf,
        agent: usize,
        found: PathBuf,
    },

    /// Some agents finished while others still had entries
    Shape {
        round: u64,
        finished: Vec<usize>,
        active: Vec<usize>,
    },
}

impl Mismatch {
    /// Round in which the mismatch was detected
    pub fn round(&self) -> u64 {
        match self {
            Mismatch::Entry { round, .. } => *round,
            Mismatch::Shape { round, .. } => *round,
        }
    }
}

/// Result of a completed comparison run
#[derive(Debug)]
pub struct CompareReport {
    /// The verdict
    pub outcome: Outcome,

    /// Rounds the comparator opened (including the completion round)
    pub rounds: u64,

    /// Entries published across all agents
    pub entries: u64,

    /// Enumeration failures across all agents
    pub errors: u64,

    /// Arrivals the comparator consumed
    pub arrivals: u64,

    /// Gate tokens granted (including the pre-seeded ones)
    pub releases: u64,

    /// Time taken for the run
    pub duration: Duration,

    /// First divergence, when the outcome is `Different`
    pub mismatch: Option<Mismatch>,
}

/// Progress information for display
#[derive(Debug, Clone)]
pub struct CompareProgress {
    /// Rounds opened so far
    pub rounds: u64,

    /// Entries published so far
    pub entries: u64,

    /// Elapsed time
    pub elapsed: Duration,
}

impl CompareProgress {
    /// Calculate entries per second rate
    pub fn entries_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.entries as f64 / secs
        } else {
            0.0
        }
    }
}

/// Coordinates the lockstep comparison of N trees
pub struct CompareCoordinator {
    /// Configuration
    config: Arc<CompareConfig>,

    /// Directory enumeration source shared by all agents
    lister: Arc<dyn DirLister>,

    /// Comparator's side of the fabric
    port: ComparePort,

    /// Agent ports, handed out at spawn time
    agent_ports: Vec<AgentPort>,

    /// Agent threads
    agents: Vec<Agent>,

    /// Cooperative termination flag
    terminate: Arc<AtomicBool>,

    /// Fabric statistics
    stats: Arc<FabricStats>,
}

impl CompareCoordinator {
    /// Create a coordinator walking the real filesystem
    pub fn new(config: CompareConfig) -> Self {
        let lister: Arc<dyn DirLister> = if config.sorted {
            Arc::new(OsLister::new())
        } else {
            Arc::new(OsLister::unsorted())
        };
        Self::with_lister(config, lister)
    }

    /// Create a coordinator with a custom enumeration source
    pub fn with_lister(config: CompareConfig, lister: Arc<dyn DirLister>) -> Self {
        let fabric = RoundFabric::new(config.roots.len());
        let stats = fabric.stats();
        let (port, agent_ports) = fabric.split();

        Self {
            config: Arc::new(config),
            lister,
            port,
            agent_ports,
            agents: Vec::new(),
            terminate: Arc::new(AtomicBool::new(false)),
            stats,
        }
    }

    /// Get a clone of the terminate flag (for signal handlers)
    pub fn terminate_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.terminate)
    }

    /// Get the fabric statistics
    pub fn stats(&self) -> Arc<FabricStats> {
        Arc::clone(&self.stats)
    }

    /// Run the comparison
    pub fn run(mut self) -> Result<CompareReport> {
        let start = Instant::now();
        let agent_count = self.port.agent_count();

        info!(roots = agent_count, "Starting lockstep comparison");
        self.spawn_agents()?;

        let mut live = vec![true; agent_count];
        let mut live_count = agent_count;
        let mut rounds = 0u64;
        let mut outcome = Outcome::Equal;
        let mut mismatch: Option<Mismatch> = None;

        'rounds: while live_count > 0 {
            rounds += 1;
            self.stats.record_round();

            let mut entries: Vec<(usize, PathBuf)> = Vec::with_capacity(live_count);
            let mut finished: Vec<usize> = Vec::new();
            let mut interrupted = false;

            // The round barrier: one arrival per live agent
            let mut pending = live_count;
            while pending > 0 {
                match self.next_arrival()? {
                    Some(Arrival { agent, event }) => {
                        match event {
                            ArrivalEvent::Entry(path) => entries.push((agent, path)),
                            ArrivalEvent::Finished => finished.push(agent),
                        }
                        pending -= 1;
                    }
                    None => {
                        interrupted = true;
                        break;
                    }
                }
            }

            for &agent in &finished {
                if live[agent] {
                    live[agent] = false;
                    live_count -= 1;
                }
            }

            // An interrupt outranks the round's comparison
            if interrupted || self.terminate.load(Ordering::Relaxed) {
                outcome = Outcome::Interrupted;
                break 'rounds;
            }

            if !entries.is_empty() && !finished.is_empty() {
                entries.sort_by_key(|&(agent, _)| agent);
                finished.sort_unstable();
                let active: Vec<usize> = entries.iter().map(|&(agent, _)| agent).collect();
                debug!(round = rounds, finished = ?finished, active = ?active, "Shape mismatch");
                mismatch = Some(Mismatch::Shape {
                    round: rounds,
                    finished,
                    active,
                });
                outcome = Outcome::Different;
                break 'rounds;
            }

            if entries.is_empty() {
                // Everyone sent a marker; the loop condition ends the run
                debug!(round = rounds, "All agents finished");
                continue;
            }

            entries.sort_by_key(|&(agent, _)| agent);
            let (baseline_agent, baseline_full) = &entries[0];
            let baseline = self.relative(*baseline_agent, baseline_full);

            let mut diverged: Option<(usize, &Path)> = None;
            for (agent, full) in &entries[1..] {
                let found = self.relative(*agent, full);
                if found != baseline {
                    diverged = Some((*agent, found));
                    break;
                }
            }

            if let Some((agent, found)) = diverged {
                debug!(
                    round = rounds,
                    baseline = %baseline.display(),
                    found = %found.display(),
                    "Entry mismatch"
                );
                mismatch = Some(Mismatch::Entry {
                    round: rounds,
                    baseline_agent: *baseline_agent,
                    baseline: baseline.to_path_buf(),
                    agent,
                    found: found.to_path_buf(),
                });
                outcome = Outcome::Different;
                break 'rounds;
            }

            debug!(round = rounds, path = %baseline.display(), "Round matched");
            self.release_live(&live)?;
        }

        // Coordinated shutdown: let every remaining agent reach its marker
        if live_count > 0 {
            info!(live = live_count, "Coordinated shutdown");
            self.terminate.store(true, Ordering::SeqCst);
            self.shutdown_drain(&mut live, &mut live_count);
        }

        let (entry_count, dirs, errors, skipped) = self.join_agents();
        let duration = start.elapsed();

        match outcome {
            Outcome::Equal => info!(
                rounds = rounds,
                entries = entry_count,
                dirs = dirs,
                duration_ms = duration.as_millis() as u64,
                "Trees are structurally identical"
            ),
            Outcome::Different => info!(
                round = mismatch.as_ref().map(|m| m.round()).unwrap_or(rounds),
                "Trees differ"
            ),
            Outcome::Interrupted => info!(rounds = rounds, "Comparison interrupted"),
        }
        if skipped > 0 {
            debug!(skipped = skipped, "Entries skipped by filters");
        }

        Ok(CompareReport {
            outcome,
            rounds,
            entries: entry_count,
            errors,
            arrivals: self.stats.drained(),
            releases: self.stats.released(),
            duration,
            mismatch,
        })
    }

    /// Run the comparison, invoking `callback` periodically with progress
    pub fn run_with_progress<F>(self, callback: F) -> Result<CompareReport>
    where
        F: Fn(CompareProgress) + Send + 'static,
    {
        let stats = Arc::clone(&self.stats);
        let done = Arc::new(AtomicBool::new(false));
        let done_flag = Arc::clone(&done);
        let start = Instant::now();

        let ticker = thread::spawn(move || {
            while !done_flag.load(Ordering::Relaxed) {
                callback(CompareProgress {
                    rounds: stats.rounds(),
                    entries: stats.entries(),
                    elapsed: start.elapsed(),
                });
                thread::sleep(Duration::from_millis(100));
            }
        });

        let result = self.run();

        done.store(true, Ordering::Relaxed);
        let _ = ticker.join();

        result
    }

    /// Spawn one agent per root
    fn spawn_agents(&mut self) -> Result<()> {
        let ports = std::mem::take(&mut self.agent_ports);

        for (agent, port) in ports.into_iter().enumerate() {
            let spawned = Agent::spawn(
                agent,
                self.config.roots[agent].clone(),
                Arc::clone(&self.config),
                Arc::clone(&self.lister),
                port,
                Arc::clone(&self.terminate),
            )?;
            self.agents.push(spawned);
        }

        info!(count = self.agents.len(), "Agents spawned");
        Ok(())
    }

    /// Receive the next arrival
    ///
    /// `Ok(None)` means an external interrupt was observed while waiting.
    fn next_arrival(&self) -> Result<Option<Arrival>> {
        loop {
            match self.port.recv_timeout(RECV_TICK) {
                Ok(Some(arrival)) => return Ok(Some(arrival)),
                Ok(None) => {
                    if self.terminate.load(Ordering::Relaxed) {
                        return Ok(None);
                    }
                }
                Err(()) => return Err(CompareError::ChannelClosed),
            }
        }
    }

    /// Release every live agent's gate once to open the next round
    fn release_live(&self, live: &[bool]) -> Result<()> {
        for (agent, &alive) in live.iter().enumerate() {
            if alive {
                self.port
                    .release(agent)
                    .map_err(|_| CompareError::ChannelClosed)?;
            }
        }
        Ok(())
    }

    /// Consume arrivals until every live agent has sent its marker
    ///
    /// Called with the terminate flag already set. Each live agent needs at
    /// most one token to reach its next publication; an entry that raced the
    /// flag gets one more release so the agent can reach its marker.
    fn shutdown_drain(&self, live: &mut [bool], live_count: &mut usize) {
        debug!(live = *live_count, "Draining remaining agents");

        for agent in 0..live.len() {
            if live[agent] {
                let _ = self.port.try_release(agent);
            }
        }

        while *live_count > 0 {
            match self.port.recv_timeout(RECV_TICK) {
                Ok(Some(arrival)) => match arrival.event {
                    ArrivalEvent::Entry(_) => {
                        let _ = self.port.try_release(arrival.agent);
                    }
                    ArrivalEvent::Finished => {
                        if live[arrival.agent] {
                            live[arrival.agent] = false;
                            *live_count -= 1;
                        }
                    }
                },
                Ok(None) => {
                    // Timeout with an empty channel: an exited thread still
                    // marked live will never send its marker
                    for (agent, alive) in live.iter_mut().enumerate() {
                        if *alive
                            && self
                                .agents
                                .get(agent)
                                .map(|a| a.is_finished())
                                .unwrap_or(true)
                        {
                            warn!(agent = agent, "Agent exited without its completion marker");
                            *alive = false;
                            *live_count -= 1;
                        }
                    }
                }
                Err(()) => break,
            }
        }
    }

    /// Join all agent threads and collect final stats
    fn join_agents(&mut self) -> (u64, u64, u64, u64) {
        let totals = aggregate_stats(&self.agents);

        let agents = std::mem::take(&mut self.agents);
        for agent in agents {
            if let Err(e) = agent.join() {
                warn!(error = %e, "Agent failed to join cleanly");
            }
        }

        totals
    }

    /// Strip the publishing agent's own root, leaving the comparable suffix
    fn relative<'a>(&self, agent: usize, full: &'a Path) -> &'a Path {
        full.strip_prefix(&self.config.roots[agent]).unwrap_or(full)
    }
}
