use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Pacing and timeout settings of a [`Connector`](crate::Connector).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Step of every polling wait; timeouts are rounded up to whole steps.
    pub poll_interval_ms: u64,
    /// Timeout of waits whose keyword takes no timeout argument (accessibility gate).
    pub default_timeout_ms: u64,
    /// Pause after clicks, focus changes, text input and visibility changes.
    pub settle_delay_ms: u64,
    /// Pause after key sequences and between the moves of a drag.
    pub key_settle_delay_ms: u64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5000,
            default_timeout_ms: 60000,
            settle_delay_ms: 1000,
            key_settle_delay_ms: 500,
        }
    }
}

impl ConnectorConfig {
    /// Loads a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AutomationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            AutomationError::InvalidArgument(format!("Invalid config {}: {e}", path.display()))
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn key_settle_delay(&self) -> Duration {
        Duration::from_millis(self.key_settle_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "settle_delay_ms": 0 }}"#).unwrap();
        let config = ConnectorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.settle_delay(), Duration::ZERO);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.default_timeout_ms, 60000);
    }

    #[test]
    fn test_invalid_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            ConnectorConfig::from_file(file.path()),
            Err(AutomationError::InvalidArgument(_))
        ));
    }
}
