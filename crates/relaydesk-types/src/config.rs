//! Global configuration types for RelayDesk.
//!
//! `RelayConfig` represents the top-level `config.toml` that controls
//! eviction timing and transport buffering. All fields have sensible
//! defaults so a missing file is never fatal.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration for the relay process.
///
/// Loaded from `~/.relaydesk/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// How often the eviction sweeper runs, in seconds.
    #[serde(default = "default_eviction_period_secs")]
    pub eviction_period_secs: u64,

    /// Conversations inactive for longer than this are dropped from the
    /// in-memory index (the durable store is untouched), in seconds.
    #[serde(default = "default_inactivity_threshold_secs")]
    pub inactivity_threshold_secs: u64,

    /// Per-connection outbound frame buffer. A connection that falls this
    /// many frames behind starts dropping broadcasts.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

fn default_eviction_period_secs() -> u64 {
    60
}

fn default_inactivity_threshold_secs() -> u64 {
    3_600
}

fn default_outbound_buffer() -> usize {
    256
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            eviction_period_secs: default_eviction_period_secs(),
            inactivity_threshold_secs: default_inactivity_threshold_secs(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

impl RelayConfig {
    /// Sweeper period as a std `Duration`.
    pub fn eviction_period(&self) -> Duration {
        Duration::from_secs(self.eviction_period_secs)
    }

    /// Inactivity threshold as a chrono `Duration` for timestamp math.
    pub fn inactivity_threshold(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.inactivity_threshold_secs as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = RelayConfig::default();
        assert_eq!(config.eviction_period_secs, 60);
        assert_eq!(config.inactivity_threshold_secs, 3_600);
        assert_eq!(config.outbound_buffer, 256);
    }

    #[test]
    fn test_config_deserialize_empty_uses_defaults() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config, RelayConfig::default());
    }

    #[test]
    fn test_config_deserialize_partial_override() {
        let config: RelayConfig = toml::from_str("inactivity_threshold_secs = 7200").unwrap();
        assert_eq!(config.inactivity_threshold_secs, 7_200);
        assert_eq!(config.eviction_period_secs, 60);
    }

    #[test]
    fn test_duration_helpers() {
        let config = RelayConfig {
            eviction_period_secs: 30,
            inactivity_threshold_secs: 600,
            outbound_buffer: 8,
        };
        assert_eq!(config.eviction_period(), Duration::from_secs(30));
        assert_eq!(config.inactivity_threshold(), chrono::Duration::minutes(10));
    }
}
