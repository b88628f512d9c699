//! Configuration types for treesame
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use clap::Parser;
use regex::Regex;
use std::path::PathBuf;

/// Maximum number of trees compared in one run
const MAX_ROOTS: usize = 64;

/// Compare directory trees entry-by-entry for structural equality
#[derive(Parser, Debug, Clone)]
#[command(
    name = "treesame",
    version,
    about = "Compare directory trees entry-by-entry for structural equality",
    long_about = "Walks N directory trees in lockstep, one entry per round, and reports\n\
                  whether they expose the same sequence of entry names. Only names and\n\
                  tree shape are compared; file contents are not read.\n\n\
                  Exit codes: 0 identical, 1 different, 2 error, 130 interrupted.",
    after_help = "EXAMPLES:\n    \
        treesame /backup/monday /backup/tuesday\n    \
        treesame -v /srv/mirror1 /srv/mirror2 /srv/mirror3\n    \
        treesame --exclude '\\.git' --exclude 'target' /src/a /src/b\n    \
        treesame --max-depth 2 /data/old /data/new"
)]
pub struct CliArgs {
    /// Root directories to compare
    #[arg(value_name = "ROOT", required = true, num_args = 1..)]
    pub roots: Vec<PathBuf>,

    /// Suppress the header, spinner and summary
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (per-round traces)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Maximum traversal depth; root children are depth 1 (unlimited if not set)
    #[arg(short = 'd', long, value_name = "NUM")]
    pub max_depth: Option<usize>,

    /// Skip entries whose root-relative path matches pattern (can be repeated)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Trust the OS enumeration order instead of sorting each directory
    #[arg(long)]
    pub unsorted: bool,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct CompareConfig {
    /// Tree roots, one agent each
    pub roots: Vec<PathBuf>,

    /// Maximum traversal depth
    pub max_depth: Option<usize>,

    /// Show progress indicator and summary
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,

    /// Sort each directory's children by name before publishing
    pub sorted: bool,

    /// Compiled exclude patterns
    pub exclude_patterns: Vec<Regex>,
}

impl CompareConfig {
    /// Create a configuration for the given roots with default settings
    ///
    /// Sorted enumeration, no depth limit, no excludes, no progress output.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            max_depth: None,
            show_progress: false,
            verbose: false,
            sorted: true,
            exclude_patterns: Vec::new(),
        }
    }

    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.roots.is_empty() {
            return Err(ConfigError::NoRoots);
        }

        if args.roots.len() > MAX_ROOTS {
            return Err(ConfigError::TooManyRoots {
                count: args.roots.len(),
                max: MAX_ROOTS,
            });
        }

        // Compile exclude patterns
        let exclude_patterns = args
            .exclude_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidExcludePattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            roots: args.roots,
            max_depth: args.max_depth,
            show_progress: !args.quiet,
            verbose: args.verbose,
            sorted: !args.unsorted,
            exclude_patterns,
        })
    }

    /// Number of agents this configuration spawns
    pub fn agent_count(&self) -> usize {
        self.roots.len()
    }

    /// Check if a root-relative path should be excluded
    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude_patterns.iter().any(|re| re.is_match(path))
    }
}
