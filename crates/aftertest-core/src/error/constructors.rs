//! Constructor methods for CleanupError

use std::error::Error as StdError;
use std::sync::Arc;

use super::types::CleanupError;

/// Message returned when registering outside a running test
pub(crate) const NOT_IN_TEST: &str =
    "cleanup actions may only be registered while a test is running";

impl CleanupError {
    /// Create a usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Usage error for a registration attempted outside a test
    pub fn not_in_test() -> Self {
        Self::usage(NOT_IN_TEST)
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wrap the failure of a cleanup action
    pub fn action_failure(label: impl Into<String>, position: usize, error: anyhow::Error) -> Self {
        let message = format!("{:#}", error);
        let source: Box<dyn StdError + Send + Sync> = error.into();
        Self::ActionFailure {
            label: label.into(),
            position,
            message,
            source: Some(Arc::from(source)),
        }
    }

    /// Action failure caused by a panic, carrying only the panic message
    pub fn action_panic(label: impl Into<String>, position: usize, panic_message: &str) -> Self {
        Self::ActionFailure {
            label: label.into(),
            position,
            message: format!("panicked: {}", panic_message),
            source: None,
        }
    }
}
