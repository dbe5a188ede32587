//! Error types for the workflow crate.
//!
//! - `ConnectionError`: rejected edge insertions
//! - `GraphError`: node bookkeeping and structural validation
//!
//! Missing nodes are not errors for the read-only queries and traversals;
//! they return `None` or an empty list.

use crate::port::{ConnectionType, PortDirection};
use std::fmt;

/// Errors from inserting an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The target input port already holds its maximum number of edges.
    CapacityExceeded {
        target_node: String,
        connection_type: ConnectionType,
        index: u32,
        max_connections: u32,
    },
    /// An endpoint names a node that is not in the graph.
    NodeNotFound { name: String },
    /// An endpoint names a port the node's type does not declare.
    PortNotFound {
        node: String,
        direction: PortDirection,
        connection_type: ConnectionType,
        index: u32,
    },
    /// A port ordinal is beyond any plausible port.
    IndexOutOfRange { node: String, index: u32 },
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded {
                target_node,
                connection_type,
                index,
                max_connections,
            } => write!(
                f,
                "input {connection_type}[{index}] on '{target_node}' already has {max_connections} connection(s)"
            ),
            Self::NodeNotFound { name } => write!(f, "node not found: '{name}'"),
            Self::PortNotFound {
                node,
                direction,
                connection_type,
                index,
            } => {
                let direction = match direction {
                    PortDirection::Input => "input",
                    PortDirection::Output => "output",
                };
                write!(
                    f,
                    "{direction} {connection_type}[{index}] not declared on '{node}'"
                )
            }
            Self::IndexOutOfRange { node, index } => {
                write!(f, "port index {index} on '{node}' is out of range")
            }
        }
    }
}

impl std::error::Error for ConnectionError {}

/// Errors from graph bookkeeping and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A node with this name already exists.
    DuplicateName { name: String },
    /// No node with this name exists.
    NodeNotFound { name: String },
    /// A node name is empty or whitespace.
    InvalidName { name: String },
    /// A node references a type missing from the catalog.
    UnknownNodeType { node: String, node_type: String },
    /// A required input port has no incoming edge.
    RequiredInputMissing {
        node: String,
        connection_type: ConnectionType,
        index: u32,
    },
    /// A required credential is not attached.
    CredentialMissing { node: String, credential_type: String },
    /// The graph contains a cycle.
    CycleDetected,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName { name } => write!(f, "node name already in use: '{name}'"),
            Self::NodeNotFound { name } => write!(f, "node not found: '{name}'"),
            Self::InvalidName { name } => write!(f, "invalid node name: '{name}'"),
            Self::UnknownNodeType { node, node_type } => {
                write!(f, "node '{node}' uses unknown type '{node_type}'")
            }
            Self::RequiredInputMissing {
                node,
                connection_type,
                index,
            } => write!(
                f,
                "required input {connection_type}[{index}] on '{node}' has no incoming connection"
            ),
            Self::CredentialMissing {
                node,
                credential_type,
            } => write!(f, "node '{node}' requires a '{credential_type}' credential"),
            Self::CycleDetected => write!(f, "graph contains cycles"),
        }
    }
}

impl std::error::Error for GraphError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_error_display() {
        let err = ConnectionError::CapacityExceeded {
            target_node: "Agent".to_string(),
            connection_type: ConnectionType::new("ai_languageModel"),
            index: 0,
            max_connections: 1,
        };
        assert_eq!(
            err.to_string(),
            "input ai_languageModel[0] on 'Agent' already has 1 connection(s)"
        );
    }

    #[test]
    fn port_not_found_display() {
        let err = ConnectionError::PortNotFound {
            node: "Set".to_string(),
            direction: PortDirection::Output,
            connection_type: ConnectionType::main(),
            index: 3,
        };
        assert!(err.to_string().contains("output main[3]"));

        let err = ConnectionError::IndexOutOfRange {
            node: "Switch".to_string(),
            index: 5000,
        };
        assert_eq!(err.to_string(), "port index 5000 on 'Switch' is out of range");
    }

    #[test]
    fn graph_error_display() {
        let err = GraphError::RequiredInputMissing {
            node: "Agent".to_string(),
            connection_type: ConnectionType::new("ai_languageModel"),
            index: 0,
        };
        assert!(err.to_string().contains("has no incoming connection"));
        assert_eq!(GraphError::CycleDetected.to_string(), "graph contains cycles");
    }
}
