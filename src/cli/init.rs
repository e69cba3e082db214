//! `acms init`: write `acms.toml` and seed the content store.

use std::fs;

use anyhow::{Context, Result, bail};
use serde_json::json;

use crate::config::DashboardConfig;
use crate::content::PublishedPage;
use crate::log;
use crate::store::FileStore;

/// Generate acms.toml content with comments
pub fn generate_config_template() -> String {
    format!(
        r#"# acms configuration file (v{version})

[store]
path = ".acms/content.json"     # Content store file (relative to this file)
timeout_ms = 10000              # Bound on every store request

[sync]
debounce_ms = 2000              # Quiet period after the last edit before saving
synced_display_ms = 1500        # How long "Synced" shows before going idle
retry_base_ms = 2000            # First retry delay after a failed save
retry_max_ms = 60000            # Backoff cap

[content]
default_language = "en"         # sv | en | de | fr

[mapping]                       # "page:section" = "page_key/section_key"
# "about:history" = "about/story"

[groups]                        # "page:section:subsection" = field group
# "about:team:leads" = {{ prefix = "team.lead|team.guide" }}
# "home:cta:links" = {{ fields = ["cta.primary", "cta.secondary"] }}
"#,
        version = env!("CARGO_PKG_VERSION")
    )
}

/// Starter pages so a fresh store resolves every built-in top section.
pub fn starter_pages() -> Vec<PublishedPage> {
    let pages = json!([
        {
            "id": "page-home",
            "key": "home",
            "sections": {
                "hero": {
                    "hero.title": { "sv": "Välkommen till Arktis", "en": "Welcome to the Arctic" },
                    "hero.subtitle": { "en": "Aurora, snow and silence" },
                    "hero.cta.label": { "sv": "Boka nu", "en": "Book now" },
                    "meta.title": { "en": "Arctic Experiences" }
                }
            }
        },
        {
            "id": "page-about",
            "key": "about",
            "sections": {
                "hero": { "hero.title": { "sv": "Om oss", "en": "About us" } },
                "team": {}
            }
        },
        {
            "id": "page-aurora",
            "key": "aurora",
            "sections": {
                "hero": { "hero.title": { "en": "Northern Lights" } },
                "tours": {}
            }
        },
        {
            "id": "page-global",
            "key": "global",
            "sections": { "footer": {}, "nav": {} }
        },
        {
            "id": "page-hero",
            "key": "hero",
            "sections": { "hero": {} }
        }
    ]);

    serde_json::from_value(pages).unwrap_or_default()
}

/// Create a new dashboard project in the config file's directory.
///
/// If `dry_run` is true, only prints the config template to stdout.
pub fn new_project(config: &DashboardConfig, dry_run: bool) -> Result<()> {
    if dry_run {
        print!("{}", generate_config_template());
        return Ok(());
    }

    let path = &config.config_path;
    if path.exists() {
        bail!("'{}' already exists", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create '{}'", parent.display()))?;
    }
    fs::write(path, generate_config_template())
        .with_context(|| format!("Failed to write config file '{}'", path.display()))?;

    let store = FileStore::new(config.store.path.clone());
    if store.init(starter_pages())? {
        log!("init"; "seeded content store at {}", store.path().display());
    } else {
        log!("init"; "keeping existing content store at {}", store.path().display());
    }

    log!("init"; "project initialized in {}", config.get_root().display());
    Ok(())
}
