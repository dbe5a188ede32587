//! Node status resolution.
//!
//! Every render pass reduces a node's raw signals to exactly one status.
//! Several signals can hold at once (a node can be disabled and still carry
//! errors from an earlier run), so the rules are ordered and the first
//! matching rule wins. The order is part of the contract: disabling a node
//! suppresses its execution, so a disabled node with errors reads as
//! disabled.

use serde::{Deserialize, Serialize};

/// What the engine last reported for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    /// Waiting on an external trigger or resume.
    Waiting,
    /// Currently executing.
    Running,
    /// Last run succeeded.
    Success,
    /// Last run failed.
    Error,
    /// The engine reported an indeterminate outcome.
    Unknown,
    /// No execution information.
    #[default]
    None,
}

/// The raw signals a node's status is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeSignals {
    /// The user switched the node off.
    pub disabled: bool,
    /// Output data is pinned and overrides live execution.
    pub has_pinned_data: bool,
    /// Live execution phase, merged in from the latest poll.
    pub execution_phase: ExecutionPhase,
    /// The last run produced runtime errors.
    pub has_execution_errors: bool,
    /// Static validation failed.
    pub has_validation_errors: bool,
    /// Configuration changed since the last successful run.
    pub is_dirty: bool,
    /// The node's type is not in the catalog.
    pub is_uninstalled_type: bool,
}

impl NodeSignals {
    /// Resolves the signals to a status.
    #[must_use]
    pub fn resolve(&self) -> NodeStatus {
        resolve_node_status(self)
    }
}

/// The single status shown for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeStatus {
    Waiting,
    UninstalledType,
    Running,
    Disabled,
    ExecutionError,
    ValidationError,
    /// Indeterminate outcome; rendered without a badge.
    Unknown,
    Pinned,
    Dirty,
    Success,
    None,
}

impl NodeStatus {
    /// Returns false for statuses rendered without a badge.
    #[must_use]
    pub fn shows_badge(&self) -> bool {
        !matches!(self, Self::Unknown | Self::None)
    }

    /// Returns true for statuses that report a problem.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::ExecutionError | Self::ValidationError | Self::UninstalledType
        )
    }
}

/// Maps a node's signals to exactly one status, first matching rule wins.
#[must_use]
pub fn resolve_node_status(signals: &NodeSignals) -> NodeStatus {
    let phase = signals.execution_phase;

    if phase == ExecutionPhase::Waiting {
        NodeStatus::Waiting
    } else if signals.is_uninstalled_type {
        NodeStatus::UninstalledType
    } else if phase == ExecutionPhase::Running {
        NodeStatus::Running
    } else if signals.disabled {
        NodeStatus::Disabled
    } else if signals.has_execution_errors || phase == ExecutionPhase::Error {
        NodeStatus::ExecutionError
    } else if signals.has_validation_errors {
        NodeStatus::ValidationError
    } else if phase == ExecutionPhase::Unknown {
        NodeStatus::Unknown
    } else if signals.has_pinned_data {
        NodeStatus::Pinned
    } else if signals.is_dirty {
        NodeStatus::Dirty
    } else if phase == ExecutionPhase::Success {
        NodeStatus::Success
    } else {
        NodeStatus::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(execution_phase: ExecutionPhase) -> NodeSignals {
        NodeSignals {
            execution_phase,
            ..NodeSignals::default()
        }
    }

    #[test]
    fn default_is_none() {
        assert_eq!(NodeSignals::default().resolve(), NodeStatus::None);
    }

    #[test]
    fn disabled_beats_execution_error() {
        let signals = NodeSignals {
            disabled: true,
            has_execution_errors: true,
            ..NodeSignals::default()
        };
        assert_eq!(signals.resolve(), NodeStatus::Disabled);
    }

    #[test]
    fn waiting_beats_everything() {
        let signals = NodeSignals {
            disabled: true,
            is_uninstalled_type: true,
            has_execution_errors: true,
            ..phase(ExecutionPhase::Waiting)
        };
        assert_eq!(signals.resolve(), NodeStatus::Waiting);
    }

    #[test]
    fn uninstalled_beats_running() {
        let signals = NodeSignals {
            is_uninstalled_type: true,
            ..phase(ExecutionPhase::Running)
        };
        assert_eq!(signals.resolve(), NodeStatus::UninstalledType);
    }

    #[test]
    fn running_beats_disabled() {
        let signals = NodeSignals {
            disabled: true,
            ..phase(ExecutionPhase::Running)
        };
        assert_eq!(signals.resolve(), NodeStatus::Running);
    }

    #[test]
    fn execution_error_beats_validation_error() {
        let signals = NodeSignals {
            has_validation_errors: true,
            ..phase(ExecutionPhase::Error)
        };
        assert_eq!(signals.resolve(), NodeStatus::ExecutionError);
    }

    #[test]
    fn validation_error_beats_unknown() {
        let signals = NodeSignals {
            has_validation_errors: true,
            ..phase(ExecutionPhase::Unknown)
        };
        assert_eq!(signals.resolve(), NodeStatus::ValidationError);
    }

    #[test]
    fn unknown_beats_pinned_and_has_no_badge() {
        let signals = NodeSignals {
            has_pinned_data: true,
            ..phase(ExecutionPhase::Unknown)
        };
        let status = signals.resolve();
        assert_eq!(status, NodeStatus::Unknown);
        assert!(!status.shows_badge());
    }

    #[test]
    fn pinned_beats_dirty() {
        let signals = NodeSignals {
            has_pinned_data: true,
            is_dirty: true,
            ..phase(ExecutionPhase::Success)
        };
        assert_eq!(signals.resolve(), NodeStatus::Pinned);
    }

    #[test]
    fn dirty_beats_success() {
        let signals = NodeSignals {
            is_dirty: true,
            ..phase(ExecutionPhase::Success)
        };
        assert_eq!(signals.resolve(), NodeStatus::Dirty);
    }

    #[test]
    fn clean_success() {
        let status = phase(ExecutionPhase::Success).resolve();
        assert_eq!(status, NodeStatus::Success);
        assert!(status.shows_badge());
        assert!(!status.is_error());
    }

    #[test]
    fn status_wire_names() {
        let json = serde_json::to_value(NodeStatus::UninstalledType).expect("serialize");
        assert_eq!(json, "uninstalled-type");
    }
}
