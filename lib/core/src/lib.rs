//! Core domain types and utilities for flowdeck.
//!
//! This crate provides the identifier types and error handling foundation
//! shared by the workflow model, the execution poller and the engine client.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{CredentialId, ExecutionId, NodeId, ParseIdError, WorkflowId};
