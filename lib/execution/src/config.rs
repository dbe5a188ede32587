//! Poller configuration.

use serde::Deserialize;
use std::time::Duration;

/// Settings for execution polling.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PollerConfig {
    /// Interval between status fetches, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_interval_ms() -> u64 {
    1000
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl PollerConfig {
    /// Returns the polling interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_one_second() {
        assert_eq!(PollerConfig::default().interval(), Duration::from_secs(1));
    }

    #[test]
    fn missing_field_uses_default() {
        let config: PollerConfig = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(config.interval_ms, 1000);

        let config: PollerConfig =
            serde_json::from_str(r#"{"interval_ms": 250}"#).expect("deserialize");
        assert_eq!(config.interval(), Duration::from_millis(250));
    }
}
