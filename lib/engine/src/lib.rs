//! HTTP client for the workflow engine.
//!
//! Implements the execution-query collaborator and loads the node-type
//! catalog from the engine's REST API.

pub mod client;
pub mod config;
pub mod error;

pub use client::EngineClient;
pub use config::EngineConfig;
pub use error::EngineError;
