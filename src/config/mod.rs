//! Dashboard configuration management for `acms.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── store      # [store]
//! │   ├── sync       # [sync]
//! │   └── content    # [content] [mapping] [groups]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── handle     # Global config handle
//! └── mod.rs         # DashboardConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section      | Purpose                                          |
//! |--------------|--------------------------------------------------|
//! | `[store]`    | Content store file and request timeout           |
//! | `[sync]`     | Debounce, retry backoff, status display timing   |
//! | `[content]`  | Default language                                 |
//! | `[mapping]`  | Extra `page:section` → `page_key/section_key`    |
//! | `[groups]`   | Extra subsection field groups                    |

pub mod section;
pub mod types;
mod util;

use util::{find_config_file, resolve_relative};

pub use section::{ContentConfig, StoreConfig, SyncConfig};
pub use types::{ConfigDiagnostics, ConfigError, cfg, init_config};

use crate::cli::Cli;
use crate::log;
use crate::resolve::FieldGroupSpec;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Default config filename
pub const CONFIG_FILE: &str = "acms.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing acms.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub content: ContentConfig,

    /// Mapping overrides, `"page:section" = "page_key/section_key"`
    #[serde(default)]
    pub mapping: BTreeMap<String, String>,

    /// Field groups, `"page:section:subsection" = { prefix | fields }`
    #[serde(default)]
    pub groups: BTreeMap<String, FieldGroupSpec>,
}

impl DashboardConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// Except for `init`, the config file is searched upward from cwd and
    /// must exist. The project root is the config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        if cli.is_init() {
            let mut config = Self::default();
            config.config_path = resolve_relative(&cwd, &cli.config);
            config.finalize();
            return Ok(config);
        }

        let Some(config_path) = find_config_file(&cwd, &cli.config) else {
            bail!(ConfigError::Validation(format!(
                "config file '{}' not found, run 'acms init' to create one",
                cli.config.display()
            )));
        };

        let mut config = Self::from_path(&config_path)?;
        config.config_path = config_path;
        config.finalize();
        config.validate()?;
        Ok(config)
    }

    /// Resolve paths after loading.
    fn finalize(&mut self) {
        self.root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.store.path = resolve_relative(&self.root, &self.store.path);
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.store.validate(&mut diag);
        self.sync.validate(&mut diag);
        section::validate_mapping(&self.mapping, &mut diag);
        section::validate_groups(&self.groups, &mut diag);

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> DashboardConfig {
    let (parsed, ignored) = DashboardConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_str_invalid_toml() {
        let result = DashboardConfig::parse_with_ignored("[sync\ndebounce_ms = 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.mapping.is_empty());
        assert_eq!(config.get_root(), Path::new(""));
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[sync]\ndebounce_ms = 100\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = DashboardConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.sync.debounce_ms, 100);
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_no_unknown_fields() {
        let content = "[store]\ntimeout_ms = 100\n[mapping]\n\"a:b\" = \"c/d\"";
        let (_, ignored) = DashboardConfig::parse_with_ignored(content).unwrap();
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_finalize_resolves_store_path() {
        let temp = TempDir::new().unwrap();
        let mut config = DashboardConfig {
            config_path: temp.path().join(CONFIG_FILE),
            ..DashboardConfig::default()
        };
        config.finalize();

        assert_eq!(config.get_root(), temp.path());
        assert_eq!(config.store.path, temp.path().join(".acms/content.json"));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let config = test_parse_config(
            "[sync]\ndebounce_ms = 0\n[mapping]\n\"about:team\" = \"broken\"\n[groups]\n\"a:b:c\" = { fields = [] }",
        );
        let err = config.validate().unwrap_err();
        let Some(ConfigError::Diagnostics(diag)) = err.downcast_ref::<ConfigError>() else {
            panic!("expected diagnostics, got {err}");
        };
        assert_eq!(diag.errors().len(), 3);
    }
}
