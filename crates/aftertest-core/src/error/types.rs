//! Core error type for the cleanup registry

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Result type alias for registry operations
pub type CleanupResult<T> = Result<T, CleanupError>;

/// Main error type for the cleanup registry
#[derive(Error, Debug, Clone)]
pub enum CleanupError {
    /// Registration attempted while no test was running
    #[error("Usage error: {message}")]
    Usage { message: String },

    /// A cleanup action failed or panicked during a drain pass
    #[error("Cleanup action '{label}' failed at position {position}: {message}")]
    ActionFailure {
        /// Label of the failing action
        label: String,
        /// Zero-based position in execution (reversed) order
        position: usize,
        message: String,
        #[source]
        source: Option<Arc<dyn StdError + Send + Sync>>,
    },

    /// A drain was requested while another drain was still iterating
    #[error("A drain pass is already in progress")]
    DrainInProgress,

    /// Invalid configuration input
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CleanupError {
    /// Error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Usage { .. } => "AFTERTEST_USAGE",
            Self::ActionFailure { .. } => "AFTERTEST_ACTION_FAILURE",
            Self::DrainInProgress => "AFTERTEST_DRAIN_IN_PROGRESS",
            Self::Config { .. } => "AFTERTEST_CONFIG",
        }
    }

    /// Human-readable message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Usage { message } => message,
            Self::ActionFailure { message, .. } => message,
            Self::DrainInProgress => "A drain pass is already in progress",
            Self::Config { message } => message,
        }
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage { .. })
    }

    pub fn is_action_failure(&self) -> bool {
        matches!(self, Self::ActionFailure { .. })
    }

    /// Label of the failing action, for `ActionFailure`
    pub fn failed_label(&self) -> Option<&str> {
        match self {
            Self::ActionFailure { label, .. } => Some(label),
            _ => None,
        }
    }
}
