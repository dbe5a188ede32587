//! Strongly-typed identifier types.
//!
//! Identifiers exchanged with the workflow engine are opaque strings: the
//! engine assigns execution and workflow ids, and node ids loaded from a
//! persisted workflow may come from any client. Ids minted locally use ULID
//! format, providing both uniqueness and temporal ordering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Macro to generate a strongly-typed wrapper around an opaque string id.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an existing identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the id, returning the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(ParseIdError {
                        id_type: stringify!($name),
                        reason: "identifier is empty".to_string(),
                    });
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a node within a workflow.
    ///
    /// Assigned once at creation and never reused.
    NodeId
);

define_id!(
    /// Identifier of a workflow definition, assigned by the engine.
    WorkflowId
);

define_id!(
    /// Identifier of a single workflow execution, assigned by the engine.
    ExecutionId
);

define_id!(
    /// Identifier of a stored credential referenced by a node.
    CredentialId
);

impl NodeId {
    /// Mints a fresh node id.
    ///
    /// ULIDs combine a millisecond timestamp with 80 random bits, so
    /// collisions between independently created nodes are negligible.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_node_ids_are_distinct() {
        use std::collections::HashSet;

        let ids: HashSet<NodeId> = (0..1000).map(|_| NodeId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn generated_node_id_is_ulid() {
        let id = NodeId::generate();
        assert!(Ulid::from_str(id.as_str()).is_ok());
    }

    #[test]
    fn foreign_ids_are_accepted() {
        let id: NodeId = "0f5532f9-36ba-4bef-86c7-30d607400b15".parse().expect("should parse");
        assert_eq!(id.as_str(), "0f5532f9-36ba-4bef-86c7-30d607400b15");
    }

    #[test]
    fn parse_empty_fails() {
        let result: Result<ExecutionId, _> = "  ".parse();
        let err = result.unwrap_err();
        assert_eq!(err.id_type, "ExecutionId");
    }

    #[test]
    fn display_is_raw_value() {
        let id = ExecutionId::new("1234");
        assert_eq!(id.to_string(), "1234");
    }

    #[test]
    fn id_serde_is_transparent() {
        let id = WorkflowId::new("wf-7");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"wf-7\"");
        let parsed: WorkflowId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, parsed);
    }
}
