//! `[store]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [store]
//! path = ".acms/content.json"   # Content store file (relative to config dir)
//! timeout_ms = 10000            # Bound on every store request
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file holding published pages and the draft journal.
    pub path: PathBuf,

    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".acms/content.json"),
            timeout_ms: 10_000,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.path.as_os_str().is_empty() {
            diag.error("store.path", "must not be empty");
        }
        if self.timeout_ms == 0 {
            diag.error("store.timeout_ms", "must be greater than 0");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_store_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.store.path, PathBuf::from(".acms/content.json"));
        assert_eq!(config.store.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_store_config_override() {
        let config = test_parse_config("[store]\npath = \"data/store.json\"\ntimeout_ms = 500");
        assert_eq!(config.store.path, PathBuf::from("data/store.json"));
        assert_eq!(config.store.timeout_ms, 500);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = test_parse_config("[store]\ntimeout_ms = 0");
        let mut diag = ConfigDiagnostics::new();
        config.store.validate(&mut diag);
        assert_eq!(diag.errors()[0].field, "store.timeout_ms");
    }
}
