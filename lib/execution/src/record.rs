//! Execution records and the status delivered to observers.
//!
//! The engine reports each execution as a record with a lifecycle state,
//! a `finished` flag, timestamps and an opaque data payload. Observers get
//! an [`ExecutionStatus`]: the same information plus a derived duration and
//! a per-node summary extracted from the payload, ready to be merged into
//! node status resolution.

use chrono::{DateTime, Duration, Utc};
use flowdeck_core::ExecutionId;
use flowdeck_workflow::{ExecutionPhase, NodeSignals};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// The lifecycle state of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    /// Completed without errors.
    Success,
    /// Failed, including crashes of the engine worker.
    #[serde(alias = "crashed")]
    Error,
    /// Executing, or queued to execute.
    #[serde(alias = "new")]
    Running,
    /// Paused until an external event or time.
    Waiting,
    /// Stopped by a user.
    #[serde(alias = "cancelled")]
    Canceled,
    /// Anything the client does not recognise.
    #[serde(other)]
    Unknown,
}

impl ExecutionState {
    /// Returns true if this state never changes again.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Canceled)
    }
}

impl From<ExecutionState> for ExecutionPhase {
    fn from(state: ExecutionState) -> Self {
        match state {
            ExecutionState::Success => Self::Success,
            ExecutionState::Error => Self::Error,
            ExecutionState::Running => Self::Running,
            ExecutionState::Waiting => Self::Waiting,
            ExecutionState::Canceled | ExecutionState::Unknown => Self::Unknown,
        }
    }
}

/// An execution as returned by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    /// Engine-assigned id.
    pub id: ExecutionId,
    /// Whether the engine considers the execution done.
    #[serde(default)]
    pub finished: bool,
    /// Lifecycle state.
    pub status: ExecutionState,
    /// When execution began.
    pub started_at: DateTime<Utc>,
    /// When execution ended, if it has.
    #[serde(default)]
    pub stopped_at: Option<DateTime<Utc>>,
    /// Run data, present when requested.
    #[serde(default)]
    pub data: Option<JsonValue>,
}

/// What one node did during an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRunSummary {
    /// Phase of the node's latest run.
    pub phase: ExecutionPhase,
    /// Whether any run of the node raised an error.
    pub has_errors: bool,
    /// Number of times the node ran.
    pub runs: usize,
}

/// The status delivered to polling observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStatus {
    /// Engine-assigned id.
    pub id: ExecutionId,
    /// Lifecycle state.
    pub status: ExecutionState,
    /// Whether the engine considers the execution done.
    pub finished: bool,
    /// When execution began.
    pub started_at: DateTime<Utc>,
    /// When execution ended, if it has.
    pub stopped_at: Option<DateTime<Utc>>,
    /// `stopped_at - started_at` in milliseconds, when both are known.
    pub duration_ms: Option<i64>,
    /// Per-node summaries keyed by node name.
    pub nodes: BTreeMap<String, NodeRunSummary>,
    /// The raw run data.
    pub data: Option<JsonValue>,
}

impl ExecutionStatus {
    /// Returns the execution's duration, when both timestamps are known.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms.map(Duration::milliseconds)
    }

    /// Returns the summary for one node.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&NodeRunSummary> {
        self.nodes.get(name)
    }

    /// Returns the live phase of one node.
    #[must_use]
    pub fn node_phase(&self, name: &str) -> ExecutionPhase {
        self.node(name)
            .map_or(ExecutionPhase::None, |summary| summary.phase)
    }

    /// Merges this execution's live fields for one node into `signals`.
    #[must_use]
    pub fn merge_into(&self, name: &str, signals: NodeSignals) -> NodeSignals {
        let Some(summary) = self.node(name) else {
            return signals;
        };
        NodeSignals {
            execution_phase: summary.phase,
            has_execution_errors: summary.has_errors,
            ..signals
        }
    }
}

impl From<ExecutionRecord> for ExecutionStatus {
    fn from(record: ExecutionRecord) -> Self {
        let duration_ms = record
            .stopped_at
            .map(|stopped| (stopped - record.started_at).num_milliseconds());
        let nodes = record
            .data
            .as_ref()
            .map(|data| summarize_nodes(data, record.status))
            .unwrap_or_default();

        Self {
            id: record.id,
            status: record.status,
            finished: record.finished,
            started_at: record.started_at,
            stopped_at: record.stopped_at,
            duration_ms,
            nodes,
            data: record.data,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunDataPayload {
    #[serde(default)]
    result_data: ResultData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultData {
    #[serde(default)]
    run_data: BTreeMap<String, Vec<TaskData>>,
    #[serde(default)]
    last_node_executed: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskData {
    #[serde(default)]
    execution_status: Option<String>,
    #[serde(default)]
    error: Option<JsonValue>,
}

impl TaskData {
    fn has_error(&self) -> bool {
        self.error.as_ref().is_some_and(|e| !e.is_null())
            || self.execution_status.as_deref() == Some("error")
    }

    fn phase(&self) -> ExecutionPhase {
        if self.has_error() {
            return ExecutionPhase::Error;
        }
        match self.execution_status.as_deref() {
            None | Some("success") => ExecutionPhase::Success,
            Some("running") => ExecutionPhase::Running,
            Some("waiting") => ExecutionPhase::Waiting,
            Some(_) => ExecutionPhase::Unknown,
        }
    }
}

/// Extracts per-node summaries from the engine's run data.
///
/// Payloads of another shape yield no summaries.
fn summarize_nodes(data: &JsonValue, state: ExecutionState) -> BTreeMap<String, NodeRunSummary> {
    let payload = match RunDataPayload::deserialize(data) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(error = %e, "execution data has no readable run data");
            return BTreeMap::new();
        }
    };
    let result = payload.result_data;

    let mut nodes: BTreeMap<String, NodeRunSummary> = result
        .run_data
        .into_iter()
        .filter_map(|(name, tasks)| {
            let last = tasks.last()?;
            Some((
                name,
                NodeRunSummary {
                    phase: last.phase(),
                    has_errors: tasks.iter().any(TaskData::has_error),
                    runs: tasks.len(),
                },
            ))
        })
        .collect();

    // A waiting execution is parked on the last node it ran.
    if state == ExecutionState::Waiting {
        if let Some(summary) = result
            .last_node_executed
            .and_then(|name| nodes.get_mut(&name))
        {
            if !summary.has_errors {
                summary.phase = ExecutionPhase::Waiting;
            }
        }
    }

    nodes
}
