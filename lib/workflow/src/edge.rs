//! Edge types for workflow graphs.
//!
//! An edge runs from one node's output port to another node's input port.
//! Its identity is the full 4-tuple of (source node, source port, target
//! node, target port); ports are addressed by channel and ordinal.

use crate::port::ConnectionType;
use serde::{Deserialize, Serialize};

/// The target half of a persisted edge, as stored under its source.
///
/// Serialized as `{ "node": ..., "type": ..., "index": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionTarget {
    /// Name of the target node.
    pub node: String,
    /// Channel of the target input port.
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    /// Ordinal of the target input port.
    pub index: u32,
}

impl ConnectionTarget {
    /// Creates a new connection target.
    #[must_use]
    pub fn new(node: impl Into<String>, connection_type: ConnectionType, index: u32) -> Self {
        Self {
            node: node.into(),
            connection_type,
            index,
        }
    }
}

/// A complete edge reference including both endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeRef {
    /// Name of the source node.
    pub source_node: String,
    /// Channel of the source output port.
    pub source_type: ConnectionType,
    /// Ordinal of the source output port.
    pub source_index: u32,
    /// Name of the target node.
    pub target_node: String,
    /// Channel of the target input port.
    pub target_type: ConnectionType,
    /// Ordinal of the target input port.
    pub target_index: u32,
}

impl EdgeRef {
    /// Creates a new edge reference.
    #[must_use]
    pub fn new(
        source_node: impl Into<String>,
        source_type: ConnectionType,
        source_index: u32,
        target_node: impl Into<String>,
        target_type: ConnectionType,
        target_index: u32,
    ) -> Self {
        Self {
            source_node: source_node.into(),
            source_type,
            source_index,
            target_node: target_node.into(),
            target_type,
            target_index,
        }
    }

    /// Creates an edge between the first `main` ports of two nodes.
    #[must_use]
    pub fn main(source_node: impl Into<String>, target_node: impl Into<String>) -> Self {
        Self::new(
            source_node,
            ConnectionType::main(),
            0,
            target_node,
            ConnectionType::main(),
            0,
        )
    }

    /// Sets the source output ordinal.
    #[must_use]
    pub fn from_output(mut self, index: u32) -> Self {
        self.source_index = index;
        self
    }

    /// Sets the target input ordinal.
    #[must_use]
    pub fn to_input(mut self, index: u32) -> Self {
        self.target_index = index;
        self
    }

    /// Returns the target half as stored in the aggregate.
    #[must_use]
    pub fn target(&self) -> ConnectionTarget {
        ConnectionTarget::new(
            self.target_node.clone(),
            self.target_type.clone(),
            self.target_index,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_edge_uses_first_ports() {
        let edge = EdgeRef::main("Trigger", "Set");
        assert_eq!(edge.source_index, 0);
        assert_eq!(edge.target_index, 0);
        assert!(edge.source_type.is_main());
        assert!(edge.target_type.is_main());
    }

    #[test]
    fn edge_ordinals() {
        let edge = EdgeRef::main("If", "Merge").from_output(1).to_input(1);
        assert_eq!(edge.source_index, 1);
        assert_eq!(edge.target(), ConnectionTarget::new("Merge", ConnectionType::main(), 1));
    }

    #[test]
    fn connection_target_wire_shape() {
        let target = ConnectionTarget::new("Set", ConnectionType::main(), 0);
        let json = serde_json::to_value(&target).expect("serialize");
        assert_eq!(json, serde_json::json!({ "node": "Set", "type": "main", "index": 0 }));
    }
}
