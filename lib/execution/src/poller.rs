//! Execution polling.
//!
//! A [`PollingManager`] keeps at most one polling session per execution.
//! Each session is a spawned task that fetches the execution record once
//! immediately and then once per interval, hands every fetched status to
//! the observer, and ends itself when the engine reports the execution
//! finished or no longer knows it.
//!
//! Fetches within a session never overlap: the next tick is only awaited
//! after the previous fetch resolved, and ticks missed while a slow fetch
//! was in flight are skipped. Every session also carries a generation
//! number, re-checked before each dispatch, so a replaced session never
//! delivers an update and a stop cancels any fetch still in flight.
//!
//! The generation check and the observer call are not atomic. A stop issued
//! from another thread while a session sits between the two lets that one
//! update through after the stop returns; observers on a multi-threaded
//! runtime must tolerate at most one such late update. Stops issued from
//! the observer itself, or from the thread driving the session, are exact.

use crate::config::PollerConfig;
use crate::error::{FetchError, PollerError};
use crate::query::ExecutionQuery;
use crate::record::ExecutionStatus;
use flowdeck_core::ExecutionId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Shortest interval a session will poll at.
pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

struct Session {
    generation: u64,
    task: JoinHandle<()>,
}

type SessionMap = Arc<Mutex<HashMap<ExecutionId, Session>>>;

/// Manages polling sessions for executions.
///
/// Dropping the manager stops every session.
pub struct PollingManager {
    query: Arc<dyn ExecutionQuery>,
    config: PollerConfig,
    sessions: SessionMap,
    next_generation: AtomicU64,
}

impl PollingManager {
    /// Creates a manager fetching through `query`.
    #[must_use]
    pub fn new(query: Arc<dyn ExecutionQuery>, config: PollerConfig) -> Self {
        Self {
            query,
            config,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Starts polling an execution at the configured interval.
    ///
    /// Any existing session for the same execution is stopped first.
    ///
    /// # Errors
    ///
    /// Returns `PollerError::NoRuntime` when called outside a Tokio runtime.
    pub fn start_polling<F>(&self, id: ExecutionId, on_update: F) -> Result<(), PollerError>
    where
        F: Fn(ExecutionStatus) + Send + Sync + 'static,
    {
        self.start_polling_with_interval(id, on_update, self.config.interval())
    }

    /// Starts polling an execution at `interval`.
    ///
    /// Intervals below [`MIN_INTERVAL`] are raised to it.
    ///
    /// # Errors
    ///
    /// Returns `PollerError::NoRuntime` when called outside a Tokio runtime.
    pub fn start_polling_with_interval<F>(
        &self,
        id: ExecutionId,
        on_update: F,
        interval: Duration,
    ) -> Result<(), PollerError>
    where
        F: Fn(ExecutionStatus) + Send + Sync + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| PollerError::NoRuntime {
            execution_id: id.clone(),
        })?;
        let interval = interval.max(MIN_INTERVAL);
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        // The lock is held until the session is registered, so the task's
        // first generation check cannot run before the insert.
        let mut sessions = self.sessions.lock();
        if let Some(previous) = sessions.remove(&id) {
            previous.task.abort();
            tracing::debug!(execution_id = %id, "replacing polling session");
        }

        let task = runtime.spawn(run_session(
            Arc::clone(&self.query),
            Arc::clone(&self.sessions),
            id.clone(),
            generation,
            interval,
            on_update,
        ));
        tracing::debug!(
            execution_id = %id,
            interval_ms = interval.as_millis() as u64,
            "polling started"
        );
        sessions.insert(id, Session { generation, task });
        Ok(())
    }

    /// Stops polling an execution. Does nothing if it is not being polled.
    ///
    /// A fetch in flight is cancelled. See the module docs for the one
    /// update that can race a stop from another thread.
    pub fn stop_polling(&self, id: &ExecutionId) {
        let removed = self.sessions.lock().remove(id);
        if let Some(session) = removed {
            session.task.abort();
            tracing::debug!(execution_id = %id, "polling stopped");
        }
    }

    /// Stops every session.
    pub fn stop_all_polling(&self) {
        let drained: Vec<_> = self.sessions.lock().drain().collect();
        for (id, session) in drained {
            session.task.abort();
            tracing::debug!(execution_id = %id, "polling stopped");
        }
    }

    /// Returns true if the execution has a live session.
    #[must_use]
    pub fn is_polling(&self, id: &ExecutionId) -> bool {
        self.sessions
            .lock()
            .get(id)
            .is_some_and(|session| !session.task.is_finished())
    }

    /// Returns the executions with live sessions.
    #[must_use]
    pub fn active_sessions(&self) -> Vec<ExecutionId> {
        let mut ids: Vec<_> = self
            .sessions
            .lock()
            .iter()
            .filter(|(_, session)| !session.task.is_finished())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }
}

impl Drop for PollingManager {
    fn drop(&mut self) {
        self.stop_all_polling();
    }
}

impl std::fmt::Debug for PollingManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingManager")
            .field("config", &self.config)
            .field("sessions", &self.sessions.lock().len())
            .finish_non_exhaustive()
    }
}

async fn run_session<F>(
    query: Arc<dyn ExecutionQuery>,
    sessions: SessionMap,
    id: ExecutionId,
    generation: u64,
    interval: Duration,
    on_update: F,
) where
    F: Fn(ExecutionStatus) + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        match query.fetch_execution(&id).await {
            Ok(record) => {
                let status = ExecutionStatus::from(record);
                let finished = status.finished;

                if !is_current(&sessions, &id, generation) {
                    return;
                }
                on_update(status);

                if finished {
                    tracing::info!(execution_id = %id, "execution finished, polling ended");
                    release(&sessions, &id, generation);
                    return;
                }
            }
            Err(FetchError::NotFound { .. }) => {
                tracing::info!(execution_id = %id, "execution not found, polling ended");
                release(&sessions, &id, generation);
                return;
            }
            Err(e) => {
                tracing::warn!(execution_id = %id, error = %e, "execution fetch failed");
            }
        }
    }
}

fn is_current(sessions: &SessionMap, id: &ExecutionId, generation: u64) -> bool {
    sessions
        .lock()
        .get(id)
        .is_some_and(|session| session.generation == generation)
}

fn release(sessions: &SessionMap, id: &ExecutionId, generation: u64) {
    let mut sessions = sessions.lock();
    if sessions
        .get(id)
        .is_some_and(|session| session.generation == generation)
    {
        sessions.remove(id);
    }
}
