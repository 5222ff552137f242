//! Error types for session and execution operations.

use thiserror::Error;

/// Errors reported to the immediate caller. None of them are fatal to the process.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The referenced session is absent or past its deadline.
    #[error("session expired or not found: {0}")]
    SessionExpiredOrNotFound(String),

    /// A remote interpreter or sandbox service failed, or the call itself failed.
    #[error("{subsystem} failed: {message}")]
    Provider {
        /// Name of the failing backend (e.g. "piston", "codesandbox").
        subsystem: String,
        /// Failure detail as reported by the backend or transport.
        message: String,
    },

    /// A required input is missing or unmapped.
    #[error("invalid request: {0}")]
    Validation(String),
}

impl RunnerError {
    pub fn provider(subsystem: impl Into<String>, message: impl Into<String>) -> Self {
        RunnerError::Provider {
            subsystem: subsystem.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        RunnerError::Validation(message.into())
    }

    /// Check if this error means the session is gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RunnerError::SessionExpiredOrNotFound(_))
    }

    /// Check if this error came from a remote backend.
    pub fn is_provider(&self) -> bool {
        matches!(self, RunnerError::Provider { .. })
    }

    /// Check if this error was raised before any backend was contacted.
    pub fn is_validation(&self) -> bool {
        matches!(self, RunnerError::Validation(_))
    }
}

/// Result type alias for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
