//! Workflow nodes.
//!
//! A node is one unit of work in a workflow. Each node has:
//! - An opaque id, assigned once at creation
//! - A name, unique within its workflow, used as the key in connections
//! - A reference into the node type catalog
//! - Parameters and credential references interpreted by its type

use crate::catalog::NodeTypeDescription;
use crate::naming::generate_unique_name;
use flowdeck_core::{CredentialId, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// A reference from a node to a stored credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRef {
    /// The stored credential's id, if it has been saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CredentialId>,
    /// The credential's display name.
    pub name: String,
}

impl CredentialRef {
    /// Creates a reference to a saved credential.
    #[must_use]
    pub fn new(id: CredentialId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }
}

/// A node in a workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Stable identifier.
    pub id: NodeId,
    /// Name, unique within the workflow.
    pub name: String,
    /// Node type name in the catalog.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Version of the node type this node was built against.
    pub type_version: f64,
    /// Canvas coordinate; not interpreted by the core.
    #[serde(default)]
    pub position: [f64; 2],
    /// Type-specific parameters.
    #[serde(default)]
    pub parameters: Map<String, JsonValue>,
    /// Credential type name to credential reference.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub credentials: BTreeMap<String, CredentialRef>,
    /// Whether the node is switched off.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

impl Node {
    /// Creates a node with a fresh id and no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: NodeId::generate(),
            name: name.into(),
            node_type: node_type.into(),
            type_version: 1.0,
            position: [0.0, 0.0],
            parameters: Map::new(),
            credentials: BTreeMap::new(),
            disabled: false,
        }
    }

    /// Sets a parameter value.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Attaches a credential for the given credential type.
    #[must_use]
    pub fn with_credential(mut self, credential_type: impl Into<String>, credential: CredentialRef) -> Self {
        self.credentials.insert(credential_type.into(), credential);
        self
    }

    /// Returns true if a credential of the given type is attached.
    #[must_use]
    pub fn has_credential(&self, credential_type: &str) -> bool {
        self.credentials.contains_key(credential_type)
    }
}

/// Builds a new node from a catalog entry.
///
/// The node gets a fresh id, the type's default parameters and version, and
/// a name derived from `requested_name` (or the type's display name) that
/// does not collide with any name in `existing_nodes`. The node is not
/// inserted anywhere.
#[must_use]
pub fn create_node(
    description: &NodeTypeDescription,
    position: [f64; 2],
    requested_name: Option<&str>,
    existing_nodes: &[Node],
) -> Node {
    let base = requested_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(description.display_name.as_str());
    let existing: Vec<&str> = existing_nodes.iter().map(|node| node.name.as_str()).collect();

    Node {
        id: NodeId::generate(),
        name: generate_unique_name(base, &existing),
        node_type: description.name.clone(),
        type_version: description.default_version,
        position,
        parameters: description.default_parameters.clone(),
        credentials: BTreeMap::new(),
        disabled: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn http_request() -> NodeTypeDescription {
        NodeTypeDescription::new("n8n-nodes-base.httpRequest", "HTTP Request")
            .with_default_parameter("method", serde_json::json!("GET"))
    }

    #[test]
    fn create_node_copies_type_defaults() {
        let node = create_node(&http_request(), [100.0, 200.0], None, &[]);

        assert_eq!(node.name, "HTTP Request");
        assert_eq!(node.node_type, "n8n-nodes-base.httpRequest");
        assert_eq!(node.position, [100.0, 200.0]);
        assert_eq!(node.parameters["method"], "GET");
        assert!(!node.disabled);
        assert!(node.credentials.is_empty());
    }

    #[test]
    fn create_node_prefers_requested_name() {
        let node = create_node(&http_request(), [0.0, 0.0], Some("Fetch users"), &[]);
        assert_eq!(node.name, "Fetch users");

        let blank = create_node(&http_request(), [0.0, 0.0], Some("  "), &[]);
        assert_eq!(blank.name, "HTTP Request");
    }

    #[test]
    fn repeated_creation_yields_distinct_names_and_ids() {
        let description = http_request();
        let mut nodes: Vec<Node> = Vec::new();
        for _ in 0..25 {
            let node = create_node(&description, [0.0, 0.0], None, &nodes);
            nodes.push(node);
        }

        let names: HashSet<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        let ids: HashSet<&NodeId> = nodes.iter().map(|n| &n.id).collect();
        assert_eq!(names.len(), 25);
        assert_eq!(ids.len(), 25);
        assert_eq!(nodes[1].name, "HTTP Request1");
        assert_eq!(nodes[2].name, "HTTP Request2");
    }

    #[test]
    fn node_wire_format() {
        let json = serde_json::json!({
            "id": "8b7c0e86-3c1f-4d43-9d33-1f1b1c6e6a57",
            "name": "Slack",
            "type": "n8n-nodes-base.slack",
            "typeVersion": 2.2,
            "position": [460, 300],
            "parameters": { "channel": "#ops" },
            "credentials": { "slackApi": { "id": "12", "name": "Ops bot" } }
        });

        let node: Node = serde_json::from_value(json).expect("deserialize");
        assert_eq!(node.type_version, 2.2);
        assert!(!node.disabled);
        assert!(node.has_credential("slackApi"));
        assert_eq!(
            node.credentials["slackApi"].id.as_ref().map(CredentialId::as_str),
            Some("12")
        );

        let back = serde_json::to_value(&node).expect("serialize");
        assert!(back.get("disabled").is_none());
        assert_eq!(back["typeVersion"], 2.2);
    }
}
