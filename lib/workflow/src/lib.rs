//! Workflow graph model for the flowdeck editor.
//!
//! This crate provides the editor-side view of a workflow, including:
//!
//! - **Graph Model**: nodes, ports and the engine's connection aggregate
//! - **Graph Algorithms**: unique naming, node creation, connecting,
//!   disconnecting and traversal
//! - **Node Status**: reduction of a node's raw signals to one display status
//! - **Documents**: the engine's persisted workflow format

pub mod catalog;
pub mod connection;
pub mod document;
pub mod edge;
pub mod error;
pub mod graph;
pub mod naming;
pub mod node;
pub mod port;
pub mod status;

pub use catalog::{CredentialRequirement, InMemoryCatalog, NodeTypeCatalog, NodeTypeDescription};
pub use connection::{
    Connections, MAX_PORT_INDEX, NodeConnections, build_connection, build_connection_checked,
    predecessors_of, remove_connection, remove_node_connections, rename_node_connections,
    successors_of,
};
pub use document::{Workflow, WorkflowDocument, WorkflowMetadata};
pub use edge::{ConnectionTarget, EdgeRef};
pub use error::{ConnectionError, GraphError};
pub use graph::WorkflowGraph;
pub use naming::generate_unique_name;
pub use node::{CredentialRef, Node, create_node};
pub use port::{ConnectionType, Port, PortDirection};
pub use status::{ExecutionPhase, NodeSignals, NodeStatus, resolve_node_status};
