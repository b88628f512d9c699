//! Error types for treesame
//!
//! This module defines the error hierarchy for the tool:
//! - Configuration and CLI errors
//! - Agent thread errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - A mismatch between trees is a verdict, never an error
//! - Preserve error chains for debugging

use thiserror::Error;

/// Top-level error type for the treesame application
#[derive(Error, Debug)]
pub enum CompareError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Agent thread errors
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// Fabric severed while agents were still expected to report
    #[error("Comparison fabric closed unexpectedly")]
    ChannelClosed,
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No roots supplied
    #[error("At least one root directory is required")]
    NoRoots,

    /// Too many roots to compare at once
    #[error("Too many roots ({count}): at most {max} trees can be compared")]
    TooManyRoots { count: usize, max: usize },

    /// Invalid exclude pattern
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },
}

/// Agent thread errors
#[derive(Error, Debug)]
pub enum AgentError {
    /// Agent thread could not be started
    #[error("Failed to start agent {id}: {reason}")]
    InitFailed { id: usize, reason: String },

    /// Agent panicked
    #[error("Agent {id} panicked: {message}")]
    Panicked { id: usize, message: String },
}

/// Result type alias for CompareError
pub type Result<T> = std::result::Result<T, CompareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let cfg_err = ConfigError::NoRoots;
        let top: CompareError = cfg_err.into();
        assert!(matches!(top, CompareError::Config(_)));

        let agent_err = AgentError::InitFailed {
            id: 3,
            reason: "out of threads".into(),
        };
        let top: CompareError = agent_err.into();
        assert!(matches!(top, CompareError::Agent(_)));
    }

    #[test]
    fn test_error_messages() {
        let err = ConfigError::TooManyRoots { count: 99, max: 64 };
        assert!(err.to_string().contains("99"));
        assert!(err.to_string().contains("64"));

        let err = AgentError::Panicked {
            id: 1,
            message: "boom".into(),
        };
        assert!(err.to_string().contains("Agent 1"));
    }
}
