//! Traversal agent threads
//!
//! Each agent:
//! - Owns one root and walks it depth-first, one entry per round
//! - Spends a gate token on every publication (entries and the marker)
//! - Observes the terminate flag right after publishing and unwinds
//! - Always ends with a single `Finished` marker, whatever stopped it
//!
//! A directory that cannot be listed abandons the whole traversal: the
//! agent logs it, counts it, and goes straight to its marker. The
//! comparator then sees the asymmetry as an ordinary shape difference.

use crate::config::CompareConfig;
use crate::error::AgentError;
use crate::listing::DirLister;
use crate::lockstep::fabric::AgentPort;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

/// Statistics collected by an agent
#[derive(Debug, Default)]
pub struct AgentStats {
    /// Entries published into the fabric
    pub entries_published: AtomicU64,

    /// Directories enumerated
    pub dirs_walked: AtomicU64,

    /// Enumeration failures
    pub errors: AtomicU64,

    /// Entries skipped (excluded or beyond the depth limit)
    pub skipped: AtomicU64,
}

impl AgentStats {
    fn record_entry(&self) {
        self.entries_published.fetch_add(1, Ordering::Relaxed);
    }

    fn record_dir(&self) {
        self.dirs_walked.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }
}

/// A traversal agent bound to one root
pub struct Agent {
    /// Agent ID (also the index of its root)
    id: usize,

    /// Root this agent walks
    root: PathBuf,

    /// Thread handle
    handle: Option<JoinHandle<()>>,

    /// Agent statistics
    stats: Arc<AgentStats>,
}

impl Agent {
    /// Spawn a new agent thread
    pub fn spawn(
        id: usize,
        root: PathBuf,
        config: Arc<CompareConfig>,
        lister: Arc<dyn DirLister>,
        port: AgentPort,
        terminate: Arc<AtomicBool>,
    ) -> Result<Self, AgentError> {
        let stats = Arc::new(AgentStats::default());
        let stats_clone = Arc::clone(&stats);
        let thread_root = root.clone();

        let handle = thread::Builder::new()
            .name(format!("agent-{}", id))
            .spawn(move || {
                agent_loop(id, thread_root, config, lister, port, terminate, stats_clone)
            })
            .map_err(|e| AgentError::InitFailed {
                id,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            root,
            handle: Some(handle),
            stats,
        })
    }

    /// Get agent ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Root this agent walks
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get agent statistics
    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    /// Whether the agent thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| h.is_finished())
            .unwrap_or(true)
    }

    /// Wait for the agent to finish
    pub fn join(mut self) -> Result<(), AgentError> {
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| AgentError::Panicked {
                id: self.id,
                message: "Agent thread panicked".into(),
            })
        } else {
            Ok(())
        }
    }
}

/// How a recursive walk ended
enum WalkEnd {
    /// Every entry was visited
    Completed,
    /// Terminate observed after a publication; unwound early
    Terminated,
    /// A directory listing failed; traversal abandoned
    Failed,
    /// The comparator side of the fabric is gone
    Disconnected,
}

struct WalkContext<'a> {
    id: usize,
    config: &'a CompareConfig,
    lister: &'a dyn DirLister,
    port: &'a AgentPort,
    terminate: &'a AtomicBool,
    stats: &'a AgentStats,
}

/// Main agent body: walk, then the uniform completion publication
fn agent_loop(
    id: usize,
    root: PathBuf,
    config: Arc<CompareConfig>,
    lister: Arc<dyn DirLister>,
    port: AgentPort,
    terminate: Arc<AtomicBool>,
    stats: Arc<AgentStats>,
) {
    info!(agent = id, root = %root.display(), "Agent starting");

    let cx = WalkContext {
        id,
        config: &config,
        lister: lister.as_ref(),
        port: &port,
        terminate: &terminate,
        stats: &stats,
    };

    match walk_dir(&cx, &root, Path::new(""), 0) {
        WalkEnd::Disconnected => {
            debug!(agent = id, "Fabric closed; exiting without marker");
            return;
        }
        WalkEnd::Completed => {}
        WalkEnd::Terminated => {
            debug!(agent = id, "Terminate observed; traversal unwound");
        }
        WalkEnd::Failed => {
            debug!(agent = id, "Traversal abandoned after listing failure");
        }
    }

    // Uniform completion: the marker spends a gate token like any entry,
    // which guarantees the comparator consumed everything sent before it.
    if cx.port.acquire().is_err() {
        return;
    }
    let _ = cx.port.finish();

    info!(
        agent = id,
        entries = stats.entries_published.load(Ordering::Relaxed),
        dirs = stats.dirs_walked.load(Ordering::Relaxed),
        errors = stats.errors.load(Ordering::Relaxed),
        "Agent finished"
    );
}

/// Recursively walk one directory, publishing each child in order
fn walk_dir(cx: &WalkContext, dir: &Path, rel: &Path, depth: usize) -> WalkEnd {
    let children = match cx.lister.list(dir) {
        Ok(children) => children,
        Err(e) => {
            warn!(
                agent = cx.id,
                path = %dir.display(),
                error = %e,
                "Directory listing failed; abandoning traversal"
            );
            cx.stats.record_error();
            return WalkEnd::Failed;
        }
    };

    cx.stats.record_dir();

    for child in children {
        let child_rel = rel.join(&child.name);
        let child_depth = depth + 1;

        if cx.config.is_excluded(&child_rel.to_string_lossy()) {
            cx.stats.record_skip();
            trace!(agent = cx.id, path = %child_rel.display(), "Excluded");
            continue;
        }

        if let Some(max) = cx.config.max_depth {
            if child_depth > max {
                cx.stats.record_skip();
                continue;
            }
        }

        let full = dir.join(&child.name);

        if cx.port.acquire().is_err() {
            return WalkEnd::Disconnected;
        }
        if cx.port.publish(full.clone()).is_err() {
            return WalkEnd::Disconnected;
        }
        cx.stats.record_entry();
        trace!(agent = cx.id, path = %full.display(), "Entry published");

        // Checked after each publication, never mid-recursion
        if cx.terminate.load(Ordering::Relaxed) {
            return WalkEnd::Terminated;
        }

        // Symlinks are published by name but never followed
        if child.kind.is_dir() {
            match walk_dir(cx, &full, &child_rel, child_depth) {
                WalkEnd::Completed => {}
                end => return end,
            }
        }
    }

    WalkEnd::Completed
}

/// Aggregate statistics from multiple agents
pub fn aggregate_stats(agents: &[Agent]) -> (u64, u64, u64, u64) {
    let mut entries = 0u64;
    let mut dirs = 0u64;
    let mut errors = 0u64;
    let mut skipped = 0u64;

    for agent in agents {
        entries += agent.stats.entries_published.load(Ordering::Relaxed);
        dirs += agent.stats.dirs_walked.load(Ordering::Relaxed);
        errors += agent.stats.errors.load(Ordering::Relaxed);
        skipped += agent.stats.skipped.load(Ordering::Relaxed);
    }

    (entries, dirs, errors, skipped)
}
