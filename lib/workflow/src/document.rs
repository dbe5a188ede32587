//! Persisted workflow documents.
//!
//! A workflow is exchanged with the engine as one JSON document holding its
//! metadata, a flat node list, the connection aggregate keyed by node name,
//! and pinned data keyed by node name. [`Workflow`] is the in-memory form,
//! with the node list and connections held by a [`WorkflowGraph`].

use crate::connection::Connections;
use crate::error::GraphError;
use crate::graph::WorkflowGraph;
use crate::node::Node;
use flowdeck_core::WorkflowId;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// The engine's wire shape for a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDocument {
    /// Assigned by the engine on first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WorkflowId>,
    /// Display name.
    pub name: String,
    /// Whether the engine runs the workflow's triggers.
    #[serde(default)]
    pub active: bool,
    /// All nodes.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Connections keyed by source node name.
    #[serde(default)]
    pub connections: Connections,
    /// Pinned output data keyed by node name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pin_data: BTreeMap<String, JsonValue>,
    /// Engine-specific settings, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<JsonValue>,
}

/// Metadata for a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    /// Engine-assigned id, if saved.
    pub id: Option<WorkflowId>,
    /// Display name.
    pub name: String,
    /// Whether the workflow is active.
    pub active: bool,
    /// Engine-specific settings.
    pub settings: Option<JsonValue>,
}

impl WorkflowMetadata {
    /// Creates metadata for an unsaved, inactive workflow.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            active: false,
            settings: None,
        }
    }
}

/// A workflow held by the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    /// Metadata.
    pub metadata: WorkflowMetadata,
    /// Nodes, connections and pinned data.
    pub graph: WorkflowGraph,
}

impl Workflow {
    /// Creates an empty workflow.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: WorkflowMetadata::new(name),
            graph: WorkflowGraph::new(),
        }
    }

    /// Builds a workflow from its persisted document.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::DuplicateName` if the document violates name
    /// uniqueness.
    pub fn from_document(document: WorkflowDocument) -> Result<Self, GraphError> {
        let graph =
            WorkflowGraph::from_parts(document.nodes, document.connections, document.pin_data)?;
        Ok(Self {
            metadata: WorkflowMetadata {
                id: document.id,
                name: document.name,
                active: document.active,
                settings: document.settings,
            },
            graph,
        })
    }

    /// Produces the persisted document.
    #[must_use]
    pub fn to_document(&self) -> WorkflowDocument {
        let (nodes, connections, pin_data) = self.graph.clone().into_parts();
        WorkflowDocument {
            id: self.metadata.id.clone(),
            name: self.metadata.name.clone(),
            active: self.metadata.active,
            nodes,
            connections,
            pin_data,
            settings: self.metadata.settings.clone(),
        }
    }
}
