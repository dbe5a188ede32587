//! Follows one workflow execution until it finishes, logging each update.

mod config;

use crate::config::WatchConfig;
use clap::Parser;
use flowdeck_core::ExecutionId;
use flowdeck_engine::EngineClient;
use flowdeck_execution::{ExecutionState, ExecutionStatus, PollingManager};
use flowdeck_workflow::NodeSignals;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Follow a workflow execution until it finishes
#[derive(Debug, Parser)]
#[command(name = "flowdeck-watch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Execution to follow
    execution_id: ExecutionId,

    /// Polling interval in milliseconds (overrides FLOWDECK__POLLER__INTERVAL_MS)
    #[arg(short, long)]
    interval_ms: Option<u64>,

    /// Request full run data, enabling per-node statuses
    #[arg(long)]
    include_data: bool,
}

impl Cli {
    fn apply(&self, config: &mut WatchConfig) {
        if let Some(interval_ms) = self.interval_ms {
            config.poller.interval_ms = interval_ms;
        }
        if self.include_data {
            config.engine.include_data = true;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,flowdeck=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match WatchConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut config);
    tracing::debug!(?config, "loaded configuration");

    let client = match EngineClient::new(&config.engine) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "failed to create engine client");
            return ExitCode::FAILURE;
        }
    };

    let manager = PollingManager::new(Arc::new(client), config.poller.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let on_update = move |status: ExecutionStatus| {
        // The receiver only goes away on shutdown.
        let _ = tx.send(status);
    };
    if let Err(e) = manager.start_polling(cli.execution_id.clone(), on_update) {
        tracing::error!(error = %e, "failed to start polling");
        return ExitCode::FAILURE;
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut last: Option<ExecutionStatus> = None;
    loop {
        tokio::select! {
            update = rx.recv() => match update {
                Some(status) => {
                    log_status(&status);
                    last = Some(status);
                }
                // The session ended and dropped its sender.
                None => break,
            },
            _ = &mut shutdown => {
                tracing::info!(execution_id = %cli.execution_id, "interrupted, stopping");
                manager.stop_all_polling();
                return ExitCode::from(130);
            }
        }
    }

    exit_code(last.as_ref())
}

fn log_status(status: &ExecutionStatus) {
    tracing::info!(
        execution_id = %status.id,
        status = ?status.status,
        finished = status.finished,
        duration_ms = status.duration_ms,
        nodes = status.nodes.len(),
        "execution update"
    );
    for name in status.nodes.keys() {
        let node_status = status.merge_into(name, NodeSignals::default()).resolve();
        tracing::debug!(execution_id = %status.id, node = %name, status = ?node_status, "node status");
    }
}

fn exit_code(last: Option<&ExecutionStatus>) -> ExitCode {
    match last {
        Some(status) if status.finished && status.status == ExecutionState::Success => {
            ExitCode::SUCCESS
        }
        Some(status) => {
            tracing::warn!(execution_id = %status.id, status = ?status.status, "execution did not succeed");
            ExitCode::FAILURE
        }
        None => {
            tracing::warn!("no execution status received");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_execution_id_and_overrides() {
        let cli = Cli::try_parse_from(["flowdeck-watch", "1234", "--interval-ms", "500"])
            .expect("parse");
        assert_eq!(cli.execution_id.as_str(), "1234");

        let mut config = WatchConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.poller.interval_ms, 500);
        assert!(!config.engine.include_data);
    }

    #[test]
    fn include_data_flag_enables_run_data() {
        let cli = Cli::try_parse_from(["flowdeck-watch", "1234", "--include-data"]).expect("parse");
        let mut config = WatchConfig::default();
        cli.apply(&mut config);
        assert!(config.engine.include_data);
        assert_eq!(config.poller.interval_ms, 1000);
    }

    #[test]
    fn execution_id_is_required() {
        assert!(Cli::try_parse_from(["flowdeck-watch"]).is_err());
        assert!(Cli::try_parse_from(["flowdeck-watch", " "]).is_err());
    }
}
