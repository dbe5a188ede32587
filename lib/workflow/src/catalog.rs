//! Node type descriptions and the catalog that serves them.
//!
//! The catalog is owned by the engine. The editor only needs a node type's
//! default parameters, declared ports and display name to create and
//! validate nodes; nothing from the description is persisted into the graph
//! beyond the type reference on each node.

use crate::port::{ConnectionType, Port, PortDirection};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

/// A credential a node type can use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRequirement {
    /// Credential type name.
    pub name: String,
    /// Whether nodes of this type cannot run without it.
    #[serde(default)]
    pub required: bool,
}

/// Metadata describing one node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeDescription {
    /// Type name referenced by nodes (e.g. `"n8n-nodes-base.httpRequest"`).
    pub name: String,
    /// Human-readable default node name.
    pub display_name: String,
    /// Version assigned to newly created nodes.
    #[serde(default = "default_version")]
    pub default_version: f64,
    /// Parameters copied into newly created nodes.
    #[serde(default)]
    pub default_parameters: Map<String, JsonValue>,
    /// Declared input ports.
    #[serde(default)]
    pub inputs: Vec<Port>,
    /// Declared output ports.
    #[serde(default)]
    pub outputs: Vec<Port>,
    /// Credentials this type can use.
    #[serde(default)]
    pub credentials: Vec<CredentialRequirement>,
}

fn default_version() -> f64 {
    1.0
}

impl NodeTypeDescription {
    /// Creates a description with one `main` input and one `main` output.
    #[must_use]
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            default_version: default_version(),
            default_parameters: Map::new(),
            inputs: vec![Port::main(0)],
            outputs: vec![Port::main(0)],
            credentials: Vec::new(),
        }
    }

    /// Replaces the declared input ports.
    #[must_use]
    pub fn with_inputs(mut self, inputs: Vec<Port>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Replaces the declared output ports.
    #[must_use]
    pub fn with_outputs(mut self, outputs: Vec<Port>) -> Self {
        self.outputs = outputs;
        self
    }

    /// Adds a default parameter.
    #[must_use]
    pub fn with_default_parameter(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.default_parameters.insert(key.into(), value);
        self
    }

    /// Adds a credential requirement.
    #[must_use]
    pub fn with_credential(mut self, name: impl Into<String>, required: bool) -> Self {
        self.credentials.push(CredentialRequirement {
            name: name.into(),
            required,
        });
        self
    }

    /// Returns the ports declared in one direction.
    #[must_use]
    pub fn ports(&self, direction: PortDirection) -> &[Port] {
        match direction {
            PortDirection::Input => &self.inputs,
            PortDirection::Output => &self.outputs,
        }
    }

    /// Looks up a declared port by channel and ordinal.
    #[must_use]
    pub fn port(
        &self,
        direction: PortDirection,
        connection_type: &ConnectionType,
        index: u32,
    ) -> Option<&Port> {
        self.ports(direction)
            .iter()
            .find(|port| port.is(connection_type, index))
    }

    /// Returns true for types without inputs (workflow entry points).
    #[must_use]
    pub fn is_trigger(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Read access to node type descriptions.
pub trait NodeTypeCatalog: Send + Sync {
    /// Returns the description for a type name, if installed.
    fn node_type(&self, type_name: &str) -> Option<&NodeTypeDescription>;

    /// Returns true if the type is installed.
    fn contains(&self, type_name: &str) -> bool {
        self.node_type(type_name).is_some()
    }
}

/// A catalog held in memory, typically loaded once from the engine.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    types: HashMap<String, NodeTypeDescription>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a description.
    pub fn insert(&mut self, description: NodeTypeDescription) {
        self.types.insert(description.name.clone(), description);
    }

    /// Returns the number of known types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no types are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<NodeTypeDescription> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = NodeTypeDescription>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for description in iter {
            catalog.insert(description);
        }
        catalog
    }
}

impl NodeTypeCatalog for InMemoryCatalog {
    fn node_type(&self, type_name: &str) -> Option<&NodeTypeDescription> {
        self.types.get(type_name)
    }
}
