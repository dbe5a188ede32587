//! Watcher configuration.
//!
//! Composed from library configs and loaded via the `config` crate from
//! environment variables, e.g. `FLOWDECK__ENGINE__BASE_URL` or
//! `FLOWDECK__POLLER__INTERVAL_MS`.

use flowdeck_engine::EngineConfig;
use flowdeck_execution::PollerConfig;
use serde::Deserialize;

/// Watcher configuration composed from library configs.
#[derive(Debug, Default, Deserialize)]
pub struct WatchConfig {
    /// Engine connection.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Polling behaviour.
    #[serde(default)]
    pub poller: PollerConfig,
}

impl WatchConfig {
    /// Loads configuration from `FLOWDECK__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_source(
            config::Environment::with_prefix("FLOWDECK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn from_source<S>(source: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }
}
