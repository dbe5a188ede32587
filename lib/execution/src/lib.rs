//! Execution tracking for the flowdeck editor.
//!
//! - **Records**: the engine's execution record and the status observers see
//! - **Query**: the collaborator trait used to fetch records
//! - **Poller**: per-execution polling sessions with cancellation

pub mod config;
pub mod error;
pub mod poller;
pub mod query;
pub mod record;

pub use config::PollerConfig;
pub use error::{FetchError, PollerError};
pub use poller::{MIN_INTERVAL, PollingManager};
pub use query::ExecutionQuery;
pub use record::{ExecutionRecord, ExecutionState, ExecutionStatus, NodeRunSummary};
