//! Error types for the engine client.
//!
//! Client operations return `Report<EngineError>`; the execution-query
//! adapter maps these to `FetchError` for the poller.

use flowdeck_execution::FetchError;
use std::fmt;

/// Errors from engine API operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The client configuration is unusable.
    InvalidConfig { reason: String },
    /// The request could not be sent or the connection failed.
    RequestFailed { reason: String },
    /// The engine answered with a non-success status.
    UnexpectedStatus { status: u16, url: String },
    /// The response body did not have the expected shape.
    ResponseParseFailed { reason: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid engine configuration: {reason}"),
            Self::RequestFailed { reason } => write!(f, "engine request failed: {reason}"),
            Self::UnexpectedStatus { status, url } => {
                write!(f, "engine returned status {status} for {url}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse engine response: {reason}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<EngineError> for FetchError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ResponseParseFailed { reason } => Self::Decode { message: reason },
            other => Self::Transport {
                message: other.to_string(),
            },
        }
    }
}
