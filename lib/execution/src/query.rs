//! The execution-query collaborator.

use crate::error::FetchError;
use crate::record::ExecutionRecord;
use async_trait::async_trait;
use flowdeck_core::ExecutionId;

/// Fetches execution records from the engine.
///
/// This abstraction allows the poller to be tested without an engine
/// while the HTTP client backs it in production.
#[async_trait]
pub trait ExecutionQuery: Send + Sync {
    /// Fetches the current record for an execution.
    ///
    /// Returns `FetchError::NotFound` once the engine no longer knows the
    /// execution.
    async fn fetch_execution(&self, id: &ExecutionId) -> Result<ExecutionRecord, FetchError>;
}
