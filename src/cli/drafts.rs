//! `acms edit`, `acms sync`, `acms publish` and `acms status`.
//!
//! Each invocation is a short-lived session: staged drafts are pulled from
//! the store's journal, acted on, and whatever is left unsaved goes back to
//! the journal.

use std::collections::BTreeSet;

use anyhow::{Result, bail};
use owo_colors::OwoColorize;

use super::common::{Store, block_on, locate, open_store, orchestrator};
use crate::config::DashboardConfig;
use crate::content::Language;
use crate::draft::DraftUpdate;
use crate::log;
use crate::resolve::Resolver;
use crate::store::ContentStore;
use crate::sync::{FlushReport, SyncOrchestrator};

/// A single field edit from the command line.
#[derive(Debug, Clone)]
pub struct EditRequest<'a> {
    pub page: &'a str,
    pub section: &'a str,
    pub field: &'a str,
    pub lang: Language,
    pub value: &'a str,
    /// Save right away instead of only staging.
    pub sync: bool,
}

pub fn edit(config: &DashboardConfig, request: &EditRequest<'_>) -> Result<()> {
    let resolver = Resolver::from_config(config);
    let sync = orchestrator(config, open_store(config));
    block_on(edit_field(sync, &resolver, request))?
}

async fn edit_field<S: ContentStore>(
    mut sync: SyncOrchestrator<S>,
    resolver: &Resolver,
    request: &EditRequest<'_>,
) -> Result<()> {
    let located = locate(&sync, resolver, request.page, request.section, None).await?;
    let page_id = located.page.id.clone();
    let section_key = located.section_key().to_string();
    sync.load_drafts(&page_id, &section_key).await?;

    let mut update = DraftUpdate::new(
        &page_id,
        &section_key,
        request.field,
        request.lang,
        request.value,
    );
    if let Some(published) = located.page.text(&section_key, request.field, request.lang) {
        update = update.with_published(published);
    }
    let key = update.key.clone();

    if !sync.edit(update) {
        log!("edit"; "{} unchanged", key);
        return Ok(());
    }

    if request.sync {
        let report = sync.flush().await;
        print_report(&report);
        if !report.is_clean() {
            bail!("failed to save {}", key);
        }
    } else {
        sync.stage_pending().await?;
        log!("edit"; "staged {}", key);
    }
    Ok(())
}

/// Save journaled drafts, optionally of one page only.
pub fn sync(config: &DashboardConfig, page_id: Option<&str>) -> Result<()> {
    let sync = orchestrator(config, open_store(config));
    block_on(sync_journal(sync, page_id))?
}

/// Pull journaled drafts into `sync`, optionally of one page only.
pub(super) async fn load_journal(
    sync: &SyncOrchestrator<Store>,
    page_id: Option<&str>,
) -> Result<usize> {
    let sections: BTreeSet<(String, String)> = sync
        .store()
        .inner()
        .all_drafts()?
        .into_iter()
        .filter(|record| page_id.is_none_or(|id| record.key.page_id == id))
        .map(|record| (record.key.page_id, record.key.section_key))
        .collect();

    let mut loaded = 0;
    for (page_id, section_key) in &sections {
        loaded += sync.load_drafts(page_id, section_key).await?;
    }
    Ok(loaded)
}

async fn sync_journal(mut sync: SyncOrchestrator<Store>, page_id: Option<&str>) -> Result<()> {
    load_journal(&sync, page_id).await?;
    if sync.drafts().lock().is_empty() {
        log!("sync"; "nothing to save");
        return Ok(());
    }

    let report = sync.flush().await;
    print_report(&report);
    if !report.is_clean() {
        bail!("{} of {} fields failed to save", report.failed.len(), report.attempted);
    }
    Ok(())
}

fn print_report(report: &FlushReport) {
    log!("sync"; "saved {}/{} fields", report.persisted, report.attempted);
    for (key, error) in &report.failed {
        log!("error"; "{}: {}", key, error);
    }
}

pub fn publish(config: &DashboardConfig, page_id: &str) -> Result<()> {
    let mut sync = orchestrator(config, open_store(config));
    let promoted = block_on(sync.publish(page_id))??;
    log!("publish"; "{}: {} fields published", page_id, promoted);
    Ok(())
}

/// List journaled drafts.
pub fn status(config: &DashboardConfig) -> Result<()> {
    let store = open_store(config);
    let drafts = store.inner().all_drafts()?;

    if drafts.is_empty() {
        log!("status"; "no staged drafts");
        return Ok(());
    }

    log!("status"; "{} staged drafts", drafts.len());
    for record in &drafts {
        println!("  {} = {}", record.key.cyan(), record.value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::init::starter_pages;
    use crate::config::StoreConfig;
    use crate::content::DraftKey;
    use crate::store::FileStore;
    use tempfile::TempDir;

    fn project() -> (TempDir, DashboardConfig) {
        let temp = TempDir::new().unwrap();
        let config = DashboardConfig {
            store: StoreConfig {
                path: temp.path().join("content.json"),
                ..StoreConfig::default()
            },
            ..DashboardConfig::default()
        };
        FileStore::new(config.store.path.clone())
            .init(starter_pages())
            .unwrap();
        (temp, config)
    }

    fn request<'a>(field: &'a str, value: &'a str, sync: bool) -> EditRequest<'a> {
        EditRequest {
            page: "about",
            section: "hero",
            field,
            lang: Language::En,
            value,
            sync,
        }
    }

    fn published(config: &DashboardConfig, field: &str) -> Option<String> {
        let data = FileStore::new(config.store.path.clone()).read().unwrap();
        let page = data.pages.iter().find(|p| p.key == "about")?;
        page.text("hero", field, Language::En).map(str::to_owned)
    }

    #[test]
    fn test_edit_stages_then_sync_saves() {
        let (_temp, config) = project();

        edit(&config, &request("hero.title", "Our story", false)).unwrap();
        let journal = FileStore::new(config.store.path.clone()).all_drafts().unwrap();
        assert_eq!(journal.len(), 1);
        assert_eq!(
            journal[0].key,
            DraftKey::new("page-about", "hero", "hero.title", Language::En)
        );
        assert_eq!(published(&config, "hero.title").as_deref(), Some("About us"));

        sync(&config, Some("page-about")).unwrap();
        assert_eq!(published(&config, "hero.title").as_deref(), Some("Our story"));
        assert!(FileStore::new(config.store.path.clone()).all_drafts().unwrap().is_empty());
    }

    #[test]
    fn test_edit_with_sync_saves_immediately() {
        let (_temp, config) = project();
        edit(&config, &request("hero.subtitle", "Since 1998", true)).unwrap();
        assert_eq!(published(&config, "hero.subtitle").as_deref(), Some("Since 1998"));
    }

    #[test]
    fn test_unchanged_edit_is_not_staged() {
        let (_temp, config) = project();
        edit(&config, &request("hero.title", "About us", false)).unwrap();
        assert!(FileStore::new(config.store.path.clone()).all_drafts().unwrap().is_empty());
    }

    #[test]
    fn test_sync_other_page_leaves_journal() {
        let (_temp, config) = project();
        edit(&config, &request("hero.title", "Our story", false)).unwrap();

        sync(&config, Some("page-home")).unwrap();
        assert_eq!(FileStore::new(config.store.path.clone()).all_drafts().unwrap().len(), 1);
    }

    #[test]
    fn test_publish_promotes_journal() {
        let (_temp, config) = project();
        edit(&config, &request("hero.title", "Our story", false)).unwrap();

        publish(&config, "page-about").unwrap();
        assert_eq!(published(&config, "hero.title").as_deref(), Some("Our story"));
        assert!(publish(&config, "page-missing").is_err());
    }
}
