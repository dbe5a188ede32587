//! The connection aggregate and the algorithms that transform it.
//!
//! Connections are stored the way the engine persists them:
//!
//! ```text
//! { source name: { connection type: [ [ {node, type, index}, ... ], ... ] } }
//! ```
//!
//! The positional array under each channel is indexed by the source output
//! ordinal; each slot lists the targets fed by that output.
//!
//! Every transform here takes the current aggregate by reference and returns
//! a new one, so readers holding the old aggregate never observe a partial
//! update.

use crate::edge::{ConnectionTarget, EdgeRef};
use crate::error::ConnectionError;
use crate::port::ConnectionType;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// The targets fed by one output port.
pub type OutputSlot = Vec<ConnectionTarget>;

/// Highest port ordinal the checked build accepts.
pub const MAX_PORT_INDEX: u32 = 1023;

/// The outgoing connections of a single source node, keyed by channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NodeConnections(BTreeMap<ConnectionType, Vec<OutputSlot>>);

impl NodeConnections {
    /// Returns the output slots of one channel.
    #[must_use]
    pub fn channel(&self, connection_type: &ConnectionType) -> &[OutputSlot] {
        self.0
            .get(connection_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterates over channels and their output slots.
    pub fn channels(&self) -> impl Iterator<Item = (&ConnectionType, &[OutputSlot])> {
        self.0.iter().map(|(ty, slots)| (ty, slots.as_slice()))
    }

    /// Returns true if the node has no channels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn targets(&self) -> impl Iterator<Item = &ConnectionTarget> {
        self.0.values().flatten().flatten()
    }

    /// Adds every target of `other` that is not already present.
    fn merge(&mut self, other: NodeConnections) {
        for (connection_type, other_slots) in other.0 {
            let slots = self.0.entry(connection_type).or_default();
            if slots.len() < other_slots.len() {
                slots.resize_with(other_slots.len(), Vec::new);
            }
            for (slot, targets) in slots.iter_mut().zip(other_slots) {
                for target in targets {
                    if !slot.contains(&target) {
                        slot.push(target);
                    }
                }
            }
        }
    }

    fn prune_empty_channels(&mut self) {
        self.0.retain(|_, slots| slots.iter().any(|slot| !slot.is_empty()));
    }
}

impl<'de> Deserialize<'de> for NodeConnections {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Persisted workflows may contain `null` for outputs with no targets.
        let raw = BTreeMap::<ConnectionType, Vec<Option<OutputSlot>>>::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter()
                .map(|(ty, slots)| (ty, slots.into_iter().map(Option::unwrap_or_default).collect()))
                .collect(),
        ))
    }
}

/// All connections of a workflow, keyed by source node name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Connections(BTreeMap<String, NodeConnections>);

impl Connections {
    /// Creates an empty aggregate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are no source entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the outgoing connections of a source node.
    #[must_use]
    pub fn get(&self, source: &str) -> Option<&NodeConnections> {
        self.0.get(source)
    }

    /// Returns true if the node has an entry as a source.
    #[must_use]
    pub fn has_source(&self, source: &str) -> bool {
        self.0.contains_key(source)
    }

    /// Iterates over source names that have outgoing entries.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over every edge in the aggregate.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef> + '_ {
        self.0.iter().flat_map(|(source, node)| {
            node.channels().flat_map(move |(source_type, slots)| {
                slots.iter().enumerate().flat_map(move |(source_index, slot)| {
                    slot.iter().map(move |target| EdgeRef {
                        source_node: source.clone(),
                        source_type: source_type.clone(),
                        source_index: source_index as u32,
                        target_node: target.node.clone(),
                        target_type: target.connection_type.clone(),
                        target_index: target.index,
                    })
                })
            })
        })
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.0.values().map(|node| node.targets().count()).sum()
    }

    /// Returns true if exactly this edge exists.
    #[must_use]
    pub fn contains(&self, edge: &EdgeRef) -> bool {
        let target = edge.target();
        self.get(&edge.source_node)
            .map(|node| node.channel(&edge.source_type))
            .and_then(|slots| slots.get(edge.source_index as usize))
            .is_some_and(|slot| slot.contains(&target))
    }

    /// Counts the edges arriving at one input port.
    #[must_use]
    pub fn incoming_count(&self, target_node: &str, connection_type: &ConnectionType, index: u32) -> usize {
        self.0
            .values()
            .flat_map(|node| node.targets())
            .filter(|target| {
                target.node == target_node
                    && &target.connection_type == connection_type
                    && target.index == index
            })
            .count()
    }

    fn prune(&mut self) {
        for node in self.0.values_mut() {
            node.prune_empty_channels();
        }
        self.0.retain(|_, node| !node.is_empty());
    }
}

/// Returns `existing` with `edge` added.
///
/// Missing scaffolding is created so the source output ordinal is a valid
/// slot. Adding an edge that already exists returns an equal aggregate.
/// Neither port capacity nor port ordinals are checked; edges from untrusted
/// input go through [`build_connection_checked`].
#[must_use]
pub fn build_connection(edge: &EdgeRef, existing: &Connections) -> Connections {
    let mut connections = existing.clone();

    let slots = connections
        .0
        .entry(edge.source_node.clone())
        .or_default()
        .0
        .entry(edge.source_type.clone())
        .or_default();

    let source_index = edge.source_index as usize;
    if slots.len() <= source_index {
        slots.resize_with(source_index + 1, Vec::new);
    }

    let target = edge.target();
    let slot = &mut slots[source_index];
    if !slot.contains(&target) {
        slot.push(target);
    }

    connections
}

/// Returns `existing` with `edge` added, unless the target port is full.
///
/// `max_connections` is the bound declared on the target input port. An edge
/// that already exists is accepted regardless of the bound.
///
/// # Errors
///
/// Returns [`ConnectionError::IndexOutOfRange`] if either port ordinal is
/// above [`MAX_PORT_INDEX`], and [`ConnectionError::CapacityExceeded`] if
/// adding the edge would exceed `max_connections`.
pub fn build_connection_checked(
    edge: &EdgeRef,
    max_connections: Option<u32>,
    existing: &Connections,
) -> Result<Connections, ConnectionError> {
    for (node, index) in [
        (&edge.source_node, edge.source_index),
        (&edge.target_node, edge.target_index),
    ] {
        if index > MAX_PORT_INDEX {
            return Err(ConnectionError::IndexOutOfRange {
                node: node.clone(),
                index,
            });
        }
    }

    if let Some(max) = max_connections {
        let current =
            existing.incoming_count(&edge.target_node, &edge.target_type, edge.target_index);
        if current >= max as usize && !existing.contains(edge) {
            return Err(ConnectionError::CapacityExceeded {
                target_node: edge.target_node.clone(),
                connection_type: edge.target_type.clone(),
                index: edge.target_index,
                max_connections: max,
            });
        }
    }

    Ok(build_connection(edge, existing))
}

/// Returns `existing` without any edge from `source`'s `source_type`
/// channel to `target`, whatever ports those edges use.
///
/// Channels left without targets are dropped, as is a source left without
/// channels.
#[must_use]
pub fn remove_connection(
    source: &str,
    target: &str,
    source_type: &ConnectionType,
    existing: &Connections,
) -> Connections {
    let mut connections = existing.clone();

    let Some(node) = connections.0.get_mut(source) else {
        return connections;
    };
    if let Some(slots) = node.0.get_mut(source_type) {
        for slot in slots.iter_mut() {
            slot.retain(|t| t.node != target);
        }
    }
    node.prune_empty_channels();
    if node.is_empty() {
        connections.0.remove(source);
    }

    connections
}

/// Returns `existing` without any edge that starts or ends at `name`.
#[must_use]
pub fn remove_node_connections(name: &str, existing: &Connections) -> Connections {
    let mut connections = existing.clone();
    connections.0.remove(name);

    for node in connections.0.values_mut() {
        for slots in node.0.values_mut() {
            for slot in slots.iter_mut() {
                slot.retain(|t| t.node != name);
            }
        }
    }
    connections.prune();

    connections
}

/// Returns `existing` with every reference to `old` rewritten to `new`.
///
/// If `new` already has outgoing entries, the outgoing edges of `old` are
/// merged into them slot by slot.
#[must_use]
pub fn rename_node_connections(old: &str, new: &str, existing: &Connections) -> Connections {
    let mut connections = existing.clone();

    if let Some(outgoing) = connections.0.remove(old) {
        connections
            .0
            .entry(new.to_string())
            .or_default()
            .merge(outgoing);
    }
    for node in connections.0.values_mut() {
        for slots in node.0.values_mut() {
            for slot in slots.iter_mut() {
                if !slot.iter().any(|t| t.node == old) {
                    continue;
                }
                let rewritten = std::mem::take(slot);
                for mut target in rewritten {
                    if target.node == old {
                        target.node = new.to_string();
                    }
                    if !slot.contains(&target) {
                        slot.push(target);
                    }
                }
            }
        }
    }

    connections
}

/// Returns the distinct names of nodes with an edge into `name`.
///
/// Names are in scan order; callers must not rely on it.
#[must_use]
pub fn predecessors_of(name: &str, connections: &Connections) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for (source, node) in &connections.0 {
        if found.contains(source) {
            continue;
        }
        if node.targets().any(|t| t.node == name) {
            found.push(source.clone());
        }
    }
    found
}

/// Returns the distinct names of nodes `name` has an edge into.
#[must_use]
pub fn successors_of(name: &str, connections: &Connections) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let Some(node) = connections.get(name) else {
        return found;
    };
    for target in node.targets() {
        if !found.contains(&target.node) {
            found.push(target.node.clone());
        }
    }
    found
}
