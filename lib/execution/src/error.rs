//! Error types for the execution crate.
//!
//! - `FetchError`: failures reported by the execution-query collaborator
//! - `PollerError`: failures starting a polling session

use flowdeck_core::ExecutionId;
use std::fmt;

/// Errors from fetching an execution record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The execution record no longer exists. Terminal for polling.
    NotFound { execution_id: ExecutionId },
    /// The request failed in transit or the engine answered with an error.
    Transport { message: String },
    /// The engine's response could not be decoded.
    Decode { message: String },
}

impl FetchError {
    /// Returns true if the execution no longer exists.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { execution_id } => write!(f, "execution not found: {execution_id}"),
            Self::Transport { message } => write!(f, "execution fetch failed: {message}"),
            Self::Decode { message } => write!(f, "invalid execution record: {message}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Errors from the polling manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerError {
    /// Polling was started outside a Tokio runtime.
    NoRuntime { execution_id: ExecutionId },
}

impl fmt::Display for PollerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuntime { execution_id } => {
                write!(f, "cannot poll execution {execution_id}: no async runtime")
            }
        }
    }
}

impl std::error::Error for PollerError {}
