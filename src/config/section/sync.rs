//! `[sync]` section configuration.
//!
//! Timing of the autosync loop.
//!
//! # Example
//!
//! ```toml
//! [sync]
//! debounce_ms = 2000          # Quiet period after the last edit before a flush
//! synced_display_ms = 1500    # How long "Synced" shows before going idle
//! retry_base_ms = 2000        # First retry delay after a failed flush
//! retry_max_ms = 60000        # Backoff cap
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::draft::DEBOUNCE_MS;
use crate::sync::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub debounce_ms: u64,
    pub synced_display_ms: u64,
    pub retry_base_ms: u64,
    pub retry_max_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEBOUNCE_MS,
            synced_display_ms: 1500,
            retry_base_ms: 2000,
            retry_max_ms: 60_000,
        }
    }
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn synced_display(&self) -> Duration {
        Duration::from_millis(self.synced_display_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.retry_base_ms),
            Duration::from_millis(self.retry_max_ms),
        )
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.debounce_ms == 0 {
            diag.error("sync.debounce_ms", "must be greater than 0");
        }
        if self.retry_base_ms == 0 {
            diag.error("sync.retry_base_ms", "must be greater than 0");
        }
        if self.retry_base_ms > self.retry_max_ms {
            diag.error_with_hint(
                "sync.retry_max_ms",
                format!(
                    "must not be below retry_base_ms ({} < {})",
                    self.retry_max_ms, self.retry_base_ms
                ),
                "raise retry_max_ms or lower retry_base_ms",
            );
        }
        if self.synced_display_ms == 0 {
            diag.warn("sync.synced_display_ms", "\"Synced\" will never be shown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_sync_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.sync.debounce(), Duration::from_millis(2000));
        assert_eq!(config.sync.synced_display(), Duration::from_millis(1500));
        assert_eq!(config.sync.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_sync_config_partial_override() {
        let config = test_parse_config("[sync]\ndebounce_ms = 500");
        assert_eq!(config.sync.debounce_ms, 500);
        assert_eq!(config.sync.retry_max_ms, 60_000);
    }

    #[test]
    fn test_validation() {
        let config =
            test_parse_config("[sync]\ndebounce_ms = 0\nretry_base_ms = 5000\nretry_max_ms = 1000");
        let mut diag = ConfigDiagnostics::new();
        config.sync.validate(&mut diag);

        let fields: Vec<_> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["sync.debounce_ms", "sync.retry_max_ms"]);
    }

    #[test]
    fn test_zero_display_is_only_a_warning() {
        let config = test_parse_config("[sync]\nsynced_display_ms = 0");
        let mut diag = ConfigDiagnostics::new();
        config.sync.validate(&mut diag);
        assert!(!diag.has_errors());
        assert_eq!(diag.warnings().len(), 1);
    }
}
