//! Port system for workflow nodes.
//!
//! Ports are the declared input and output slots of a node type. Each port
//! belongs to a channel (its connection type) and is addressed by its ordinal
//! among ports of the same channel on that node.
//!
//! Ports are part of a node type's description and are never persisted with
//! the workflow itself.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// The channel a port or edge belongs to.
///
/// `"main"` carries the primary item stream; other values name side-channels
/// such as `"ai_tool"` or `"ai_languageModel"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionType(String);

impl ConnectionType {
    /// The name of the primary data channel.
    pub const MAIN: &'static str = "main";

    /// Creates a connection type from its tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The primary data channel.
    #[must_use]
    pub fn main() -> Self {
        Self(Self::MAIN.to_string())
    }

    /// Returns the tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the primary data channel.
    #[must_use]
    pub fn is_main(&self) -> bool {
        self.0 == Self::MAIN
    }
}

impl Default for ConnectionType {
    fn default() -> Self {
        Self::main()
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl Borrow<str> for ConnectionType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Whether a port accepts or produces edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    /// Edges terminate here.
    Input,
    /// Edges originate here.
    Output,
}

/// A declared input or output slot on a node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    /// The channel this port belongs to.
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    /// Ordinal among ports of the same channel on the node.
    #[serde(default)]
    pub index: u32,
    /// Whether the port must be connected for the node to be valid.
    #[serde(default)]
    pub required: bool,
    /// Upper bound on attached edges, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    /// Display text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Layout hint for the renderer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl Port {
    /// Creates an optional, unbounded port.
    #[must_use]
    pub fn new(connection_type: ConnectionType, index: u32) -> Self {
        Self {
            connection_type,
            index,
            required: false,
            max_connections: None,
            label: None,
            position: None,
        }
    }

    /// Creates a port on the primary data channel.
    #[must_use]
    pub fn main(index: u32) -> Self {
        Self::new(ConnectionType::main(), index)
    }

    /// Marks the port as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Bounds the number of edges the port accepts.
    #[must_use]
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = Some(max);
        self
    }

    /// Sets the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Returns true if this port is the given channel and ordinal.
    #[must_use]
    pub fn is(&self, connection_type: &ConnectionType, index: u32) -> bool {
        &self.connection_type == connection_type && self.index == index
    }
}
