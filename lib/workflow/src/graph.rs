//! Workflow graph owned by the editor.
//!
//! A graph holds the workflow's nodes, its connection aggregate and any
//! pinned output data. Node names are the keys connections and pinned data
//! refer to, so every operation that adds, renames or removes a node keeps
//! names unique and rewrites the references.
//!
//! Structural analysis (cycles, transitive ancestors and descendants) runs
//! on a petgraph view derived from the connections on demand.

use crate::catalog::{NodeTypeCatalog, NodeTypeDescription};
use crate::connection::{
    Connections, build_connection_checked, predecessors_of, remove_connection,
    remove_node_connections, rename_node_connections, successors_of,
};
use crate::edge::EdgeRef;
use crate::error::{ConnectionError, GraphError};
use crate::naming::generate_unique_name;
use crate::node::{Node, create_node};
use crate::port::{ConnectionType, Port, PortDirection};
use crate::status::NodeSignals;
use flowdeck_core::NodeId;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, Reversed};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};

/// A workflow's nodes, connections and pinned data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowGraph {
    nodes: Vec<Node>,
    connections: Connections,
    pin_data: BTreeMap<String, JsonValue>,
}

impl WorkflowGraph {
    /// Creates a new empty workflow graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a graph from persisted parts.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::DuplicateName` if two nodes share a name.
    pub fn from_parts(
        nodes: Vec<Node>,
        connections: Connections,
        pin_data: BTreeMap<String, JsonValue>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self {
            nodes: Vec::with_capacity(nodes.len()),
            connections,
            pin_data,
        };
        for node in nodes {
            graph.insert_node(node)?;
        }
        Ok(graph)
    }

    /// Splits the graph into its persisted parts.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Node>, Connections, BTreeMap<String, JsonValue>) {
        (self.nodes, self.connections, self.pin_data)
    }

    /// Returns all nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the names of all nodes.
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.name.as_str())
    }

    /// Returns a node by name.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /// Returns a mutable reference to a node by name.
    ///
    /// Renames must go through [`WorkflowGraph::rename_node`].
    pub fn node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.name == name)
    }

    /// Returns a node by id.
    #[must_use]
    pub fn node_by_id(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    /// Returns true if a node with this name exists.
    #[must_use]
    pub fn contains_node(&self, name: &str) -> bool {
        self.node(name).is_some()
    }

    /// Returns the connection aggregate.
    #[must_use]
    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    /// Returns true if exactly this edge exists.
    #[must_use]
    pub fn has_connection(&self, edge: &EdgeRef) -> bool {
        self.connections.contains(edge)
    }

    /// Returns the ports a node declares in one direction.
    ///
    /// Nodes of unknown type declare no ports.
    #[must_use]
    pub fn ports<'a>(
        &self,
        name: &str,
        direction: PortDirection,
        catalog: &'a dyn NodeTypeCatalog,
    ) -> &'a [Port] {
        self.node(name)
            .and_then(|node| catalog.node_type(&node.node_type))
            .map(|description| description.ports(direction))
            .unwrap_or_default()
    }

    /// Adds a node.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::DuplicateName` if the name is taken.
    pub fn insert_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.contains_node(&node.name) {
            return Err(GraphError::DuplicateName { name: node.name });
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Creates a node from a catalog entry and adds it.
    ///
    /// The name is made unique against the current nodes.
    pub fn add_node_from_type(
        &mut self,
        description: &NodeTypeDescription,
        position: [f64; 2],
        requested_name: Option<&str>,
    ) -> &Node {
        let node = create_node(description, position, requested_name, &self.nodes);
        tracing::debug!(node = %node.name, node_type = %node.node_type, "adding node");
        let index = self.nodes.len();
        self.nodes.push(node);
        &self.nodes[index]
    }

    /// Removes a node along with every connection and pinned data that
    /// references it.
    pub fn remove_node(&mut self, name: &str) -> Option<Node> {
        let position = self.nodes.iter().position(|node| node.name == name)?;
        let node = self.nodes.remove(position);
        self.connections = remove_node_connections(name, &self.connections);
        self.pin_data.remove(name);
        Some(node)
    }

    /// Renames a node, rewriting connections and pinned data.
    ///
    /// The requested name is trimmed and made unique against the other
    /// nodes. Returns the name actually assigned.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::NodeNotFound` if `old` does not exist, and
    /// `GraphError::InvalidName` if the requested name is blank.
    pub fn rename_node(&mut self, old: &str, requested: &str) -> Result<String, GraphError> {
        if !self.contains_node(old) {
            return Err(GraphError::NodeNotFound {
                name: old.to_string(),
            });
        }
        let requested = requested.trim();
        if requested.is_empty() {
            return Err(GraphError::InvalidName {
                name: requested.to_string(),
            });
        }
        if old == requested {
            return Ok(old.to_string());
        }

        let others: Vec<&str> = self.node_names().filter(|name| *name != old).collect();
        let new = generate_unique_name(requested, &others);

        if let Some(node) = self.node_mut(old) {
            node.name = new.clone();
        }
        self.connections = rename_node_connections(old, &new, &self.connections);
        if let Some(data) = self.pin_data.remove(old) {
            self.pin_data.insert(new.clone(), data);
        }

        Ok(new)
    }

    /// Connects two nodes, honouring the target port's capacity.
    ///
    /// Each endpoint's port is checked against the catalog when that node's
    /// type is installed.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint node is missing, a port is not
    /// declared, or the target port is full.
    pub fn connect(
        &mut self,
        edge: &EdgeRef,
        catalog: &dyn NodeTypeCatalog,
    ) -> Result<(), ConnectionError> {
        let source = self.endpoint(&edge.source_node)?;
        let target = self.endpoint(&edge.target_node)?;

        if let Some(description) = catalog.node_type(&source.node_type) {
            description
                .port(PortDirection::Output, &edge.source_type, edge.source_index)
                .ok_or_else(|| ConnectionError::PortNotFound {
                    node: edge.source_node.clone(),
                    direction: PortDirection::Output,
                    connection_type: edge.source_type.clone(),
                    index: edge.source_index,
                })?;
        }

        let mut max_connections = None;
        if let Some(description) = catalog.node_type(&target.node_type) {
            let port = description
                .port(PortDirection::Input, &edge.target_type, edge.target_index)
                .ok_or_else(|| ConnectionError::PortNotFound {
                    node: edge.target_node.clone(),
                    direction: PortDirection::Input,
                    connection_type: edge.target_type.clone(),
                    index: edge.target_index,
                })?;
            max_connections = port.max_connections;
        }

        self.connections = build_connection_checked(edge, max_connections, &self.connections)?;
        Ok(())
    }

    fn endpoint(&self, name: &str) -> Result<&Node, ConnectionError> {
        self.node(name).ok_or_else(|| ConnectionError::NodeNotFound {
            name: name.to_string(),
        })
    }

    /// Removes every edge from `source`'s channel to `target`.
    pub fn disconnect(&mut self, source: &str, target: &str, source_type: &ConnectionType) {
        self.connections = remove_connection(source, target, source_type, &self.connections);
    }

    /// Returns the direct upstream node names.
    #[must_use]
    pub fn predecessors(&self, name: &str) -> Vec<String> {
        predecessors_of(name, &self.connections)
    }

    /// Returns the direct downstream node names.
    #[must_use]
    pub fn successors(&self, name: &str) -> Vec<String> {
        successors_of(name, &self.connections)
    }

    /// Returns every node `name` transitively depends on.
    #[must_use]
    pub fn ancestors(&self, name: &str) -> Vec<String> {
        let (graph, index) = self.to_digraph();
        let Some(&start) = index.get(name) else {
            return Vec::new();
        };

        let reversed = Reversed(&graph);
        let mut dfs = Dfs::new(reversed, start);
        let mut found = Vec::new();
        while let Some(nx) = dfs.next(reversed) {
            if nx != start {
                found.push(graph[nx].to_string());
            }
        }
        found
    }

    /// Returns every node transitively downstream of `name`.
    ///
    /// Editing a node makes the output of all of these stale.
    #[must_use]
    pub fn descendants(&self, name: &str) -> Vec<String> {
        let (graph, index) = self.to_digraph();
        let Some(&start) = index.get(name) else {
            return Vec::new();
        };

        let mut dfs = Dfs::new(&graph, start);
        let mut found = Vec::new();
        while let Some(nx) = dfs.next(&graph) {
            if nx != start {
                found.push(graph[nx].to_string());
            }
        }
        found
    }

    /// Returns the pinned output data of a node.
    #[must_use]
    pub fn pin_data(&self, name: &str) -> Option<&JsonValue> {
        self.pin_data.get(name)
    }

    /// Returns true if the node has pinned output data.
    #[must_use]
    pub fn has_pinned_data(&self, name: &str) -> bool {
        self.pin_data.contains_key(name)
    }

    /// Pins output data to a node, or unpins it with `None`.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::NodeNotFound` if the node does not exist.
    pub fn set_pin_data(&mut self, name: &str, data: Option<JsonValue>) -> Result<(), GraphError> {
        if !self.contains_node(name) {
            return Err(GraphError::NodeNotFound {
                name: name.to_string(),
            });
        }
        match data {
            Some(data) => {
                self.pin_data.insert(name.to_string(), data);
            }
            None => {
                self.pin_data.remove(name);
            }
        }
        Ok(())
    }

    /// Returns the static problems of one node.
    ///
    /// Checks that the type is installed, required inputs are connected and
    /// required credentials are attached. Unknown names yield no issues.
    #[must_use]
    pub fn node_issues(&self, name: &str, catalog: &dyn NodeTypeCatalog) -> Vec<GraphError> {
        let Some(node) = self.node(name) else {
            return Vec::new();
        };
        let Some(description) = catalog.node_type(&node.node_type) else {
            return vec![GraphError::UnknownNodeType {
                node: node.name.clone(),
                node_type: node.node_type.clone(),
            }];
        };

        let mut issues = Vec::new();
        for port in description.inputs.iter().filter(|port| port.required) {
            let connected =
                self.connections
                    .incoming_count(&node.name, &port.connection_type, port.index)
                    > 0;
            if !connected {
                issues.push(GraphError::RequiredInputMissing {
                    node: node.name.clone(),
                    connection_type: port.connection_type.clone(),
                    index: port.index,
                });
            }
        }
        for credential in description.credentials.iter().filter(|c| c.required) {
            if !node.has_credential(&credential.name) {
                issues.push(GraphError::CredentialMissing {
                    node: node.name.clone(),
                    credential_type: credential.name.clone(),
                });
            }
        }
        issues
    }

    /// Validates the whole graph.
    ///
    /// Disabled nodes are not checked for issues.
    ///
    /// # Errors
    ///
    /// Returns the first node issue found, or `GraphError::CycleDetected`.
    pub fn validate(&self, catalog: &dyn NodeTypeCatalog) -> Result<(), GraphError> {
        for node in self.nodes.iter().filter(|node| !node.disabled) {
            if let Some(issue) = self.node_issues(&node.name, catalog).into_iter().next() {
                return Err(issue);
            }
        }

        let (graph, _) = self.to_digraph();
        if petgraph::algo::is_cyclic_directed(&graph) {
            return Err(GraphError::CycleDetected);
        }

        Ok(())
    }

    /// Returns the static signals of a node for status resolution.
    ///
    /// Live execution fields (phase, execution errors) are left at their
    /// defaults for the caller to merge in.
    #[must_use]
    pub fn static_signals(&self, name: &str, catalog: &dyn NodeTypeCatalog) -> Option<NodeSignals> {
        let node = self.node(name)?;
        let is_uninstalled_type = !catalog.contains(&node.node_type);
        Some(NodeSignals {
            disabled: node.disabled,
            has_pinned_data: self.has_pinned_data(name),
            has_validation_errors: !is_uninstalled_type
                && !self.node_issues(name, catalog).is_empty(),
            is_uninstalled_type,
            ..NodeSignals::default()
        })
    }

    /// Builds a petgraph view keyed by node name.
    ///
    /// Edges to names that are not nodes of this graph are skipped.
    fn to_digraph(&self) -> (DiGraph<&str, ()>, HashMap<&str, NodeIndex>) {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.connections.edge_count());
        let mut index = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            index.insert(node.name.as_str(), graph.add_node(node.name.as_str()));
        }
        for edge in self.connections.edges() {
            if let (Some(&source), Some(&target)) = (
                index.get(edge.source_node.as_str()),
                index.get(edge.target_node.as_str()),
            ) {
                graph.update_edge(source, target, ());
            }
        }
        (graph, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::connection::build_connection;

    fn catalog() -> InMemoryCatalog {
        [
            NodeTypeDescription::new("manualTrigger", "Manual Trigger").with_inputs(vec![]),
            NodeTypeDescription::new("set", "Edit Fields"),
            NodeTypeDescription::new("if", "If").with_outputs(vec![Port::main(0), Port::main(1)]),
            NodeTypeDescription::new("slack", "Slack").with_credential("slackApi", true),
            NodeTypeDescription::new("agent", "AI Agent").with_inputs(vec![
                Port::main(0),
                Port::new(ConnectionType::new("ai_languageModel"), 0)
                    .required()
                    .with_max_connections(1),
            ]),
            NodeTypeDescription::new("openAi", "OpenAI Chat Model")
                .with_inputs(vec![])
                .with_outputs(vec![Port::new(ConnectionType::new("ai_languageModel"), 0)]),
        ]
        .into_iter()
        .collect()
    }

    fn graph_with(names: &[(&str, &str)]) -> WorkflowGraph {
        let mut graph = WorkflowGraph::new();
        for (name, ty) in names {
            graph.insert_node(Node::new(*name, *ty)).expect("insert");
        }
        graph
    }

    fn linear() -> WorkflowGraph {
        let catalog = catalog();
        let mut graph = graph_with(&[("Start", "manualTrigger"), ("Set", "set"), ("If", "if")]);
        graph.connect(&EdgeRef::main("Start", "Set"), &catalog).expect("connect");
        graph.connect(&EdgeRef::main("Set", "If"), &catalog).expect("connect");
        graph
    }

    #[test]
    fn insert_rejects_duplicate_names() {
        let mut graph = graph_with(&[("Set", "set")]);
        let err = graph.insert_node(Node::new("Set", "set")).unwrap_err();
        assert_eq!(err, GraphError::DuplicateName { name: "Set".to_string() });
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn add_node_from_type_keeps_names_unique() {
        let catalog = catalog();
        let set = catalog.node_type("set").expect("set").clone();
        let mut graph = WorkflowGraph::new();

        let first = graph.add_node_from_type(&set, [0.0, 0.0], None).name.clone();
        let second = graph.add_node_from_type(&set, [0.0, 0.0], None).name.clone();

        assert_eq!(first, "Edit Fields");
        assert_eq!(second, "Edit Fields1");
    }

    #[test]
    fn lookup_by_name_and_id() {
        let graph = linear();
        let set = graph.node("Set").expect("Set");
        assert_eq!(graph.node_by_id(&set.id).map(|n| n.name.as_str()), Some("Set"));
        assert!(graph.node("Nope").is_none());
        assert!(graph.has_connection(&EdgeRef::main("Start", "Set")));
    }

    #[test]
    fn ports_come_from_catalog() {
        let catalog = catalog();
        let graph = linear();
        assert_eq!(graph.ports("If", PortDirection::Output, &catalog).len(), 2);
        assert!(graph.ports("Start", PortDirection::Input, &catalog).is_empty());
        assert!(graph.ports("Nope", PortDirection::Input, &catalog).is_empty());
    }

    #[test]
    fn connect_checks_endpoints_and_ports() {
        let catalog = catalog();
        let mut graph = linear();

        let missing = graph.connect(&EdgeRef::main("Set", "Nope"), &catalog);
        assert!(matches!(missing, Err(ConnectionError::NodeNotFound { .. })));

        let no_port = graph.connect(&EdgeRef::main("Set", "If").from_output(1), &catalog);
        assert!(matches!(no_port, Err(ConnectionError::PortNotFound { .. })));

        let trigger_input = graph.connect(&EdgeRef::main("Set", "Start"), &catalog);
        assert!(matches!(trigger_input, Err(ConnectionError::PortNotFound { .. })));
    }

    #[test]
    fn connect_enforces_capacity() {
        let catalog = catalog();
        let model = ConnectionType::new("ai_languageModel");
        let mut graph = graph_with(&[("Agent", "agent"), ("GPT", "openAi"), ("GPT2", "openAi")]);

        let edge = |source: &str| EdgeRef::new(source, model.clone(), 0, "Agent", model.clone(), 0);
        graph.connect(&edge("GPT"), &catalog).expect("first model fits");
        let err = graph.connect(&edge("GPT2"), &catalog).unwrap_err();
        assert!(matches!(err, ConnectionError::CapacityExceeded { max_connections: 1, .. }));
        assert_eq!(graph.predecessors("Agent"), vec!["GPT".to_string()]);
    }

    #[test]
    fn remove_node_cascades() {
        let mut graph = linear();
        graph.set_pin_data("Set", Some(serde_json::json!([{ "a": 1 }]))).expect("pin");

        let removed = graph.remove_node("Set").expect("removed");
        assert_eq!(removed.name, "Set");
        assert!(graph.successors("Start").is_empty());
        assert!(graph.predecessors("If").is_empty());
        assert!(graph.connections().is_empty());
        assert!(!graph.has_pinned_data("Set"));
        assert!(graph.remove_node("Set").is_none());
    }

    #[test]
    fn rename_rewrites_references() {
        let mut graph = linear();
        graph.set_pin_data("Set", Some(serde_json::json!([]))).expect("pin");

        let assigned = graph.rename_node("Set", "If").expect("rename");
        assert_eq!(assigned, "If1");
        assert_eq!(graph.successors("Start"), vec!["If1".to_string()]);
        assert_eq!(graph.successors("If1"), vec!["If".to_string()]);
        assert!(graph.has_pinned_data("If1"));
        assert!(!graph.contains_node("Set"));

        assert!(matches!(
            graph.rename_node("Nope", "X"),
            Err(GraphError::NodeNotFound { .. })
        ));
    }

    #[test]
    fn rename_trims_and_rejects_blank_names() {
        let mut graph = linear();

        assert_eq!(graph.rename_node("Set", "  Prepare  ").expect("rename"), "Prepare");
        assert!(graph.contains_node("Prepare"));

        for blank in ["", "   "] {
            assert!(matches!(
                graph.rename_node("Prepare", blank),
                Err(GraphError::InvalidName { .. })
            ));
        }
        assert!(graph.contains_node("Prepare"));
    }

    #[test]
    fn rename_onto_dangling_connection_key_keeps_edges() {
        let mut connections = Connections::new();
        connections = build_connection(&EdgeRef::main("Ghost", "B"), &connections);
        connections = build_connection(&EdgeRef::main("A", "B").to_input(1), &connections);
        let mut graph = WorkflowGraph::from_parts(
            vec![Node::new("A", "set"), Node::new("B", "set")],
            connections,
            BTreeMap::new(),
        )
        .expect("valid");

        assert_eq!(graph.rename_node("A", "Ghost").expect("rename"), "Ghost");
        assert_eq!(graph.connections().edge_count(), 2);
        assert!(graph.has_connection(&EdgeRef::main("Ghost", "B").to_input(1)));
    }

    #[test]
    fn connect_rejects_huge_index_on_uninstalled_type() {
        let catalog = catalog();
        let mut graph = graph_with(&[("Custom", "community.unknown"), ("Set", "set")]);
        let err = graph
            .connect(&EdgeRef::main("Custom", "Set").from_output(u32::MAX), &catalog)
            .unwrap_err();
        assert!(matches!(err, ConnectionError::IndexOutOfRange { .. }));
        assert!(graph.connections().is_empty());
    }

    #[test]
    fn ancestors_and_descendants() {
        let graph = linear();
        let mut ancestors = graph.ancestors("If");
        ancestors.sort();
        assert_eq!(ancestors, vec!["Set".to_string(), "Start".to_string()]);

        let mut descendants = graph.descendants("Start");
        descendants.sort();
        assert_eq!(descendants, vec!["If".to_string(), "Set".to_string()]);

        assert!(graph.descendants("If").is_empty());
        assert!(graph.ancestors("Nope").is_empty());
    }

    #[test]
    fn validate_reports_missing_required_input() {
        let catalog = catalog();
        let graph = graph_with(&[("Agent", "agent")]);
        assert_eq!(
            graph.validate(&catalog),
            Err(GraphError::RequiredInputMissing {
                node: "Agent".to_string(),
                connection_type: ConnectionType::new("ai_languageModel"),
                index: 0,
            })
        );
    }

    #[test]
    fn validate_reports_missing_credential() {
        let catalog = catalog();
        let graph = graph_with(&[("Slack", "slack")]);
        assert!(matches!(
            graph.validate(&catalog),
            Err(GraphError::CredentialMissing { .. })
        ));
    }

    #[test]
    fn validate_skips_disabled_nodes() {
        let catalog = catalog();
        let mut graph = graph_with(&[("Slack", "slack")]);
        graph.node_mut("Slack").expect("Slack").disabled = true;
        assert_eq!(graph.validate(&catalog), Ok(()));
    }

    #[test]
    fn validate_detects_cycles() {
        let catalog = catalog();
        let mut graph = linear();
        graph.connect(&EdgeRef::main("If", "Set"), &catalog).expect("connect");
        assert_eq!(graph.validate(&catalog), Err(GraphError::CycleDetected));
    }

    #[test]
    fn static_signals_reflect_node_state() {
        let catalog = catalog();
        let mut graph = graph_with(&[("Slack", "slack"), ("Custom", "community.thing")]);
        graph.set_pin_data("Slack", Some(serde_json::json!([]))).expect("pin");

        let slack = graph.static_signals("Slack", &catalog).expect("Slack");
        assert!(slack.has_pinned_data);
        assert!(slack.has_validation_errors);
        assert!(!slack.is_uninstalled_type);

        let custom = graph.static_signals("Custom", &catalog).expect("Custom");
        assert!(custom.is_uninstalled_type);
        assert!(!custom.has_validation_errors);

        assert!(graph.static_signals("Nope", &catalog).is_none());
    }
}
