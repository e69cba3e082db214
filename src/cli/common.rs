//! Common utilities shared across CLI commands.

use std::future::Future;

use anyhow::{Context, Result};

use crate::config::DashboardConfig;
use crate::content::PublishedPage;
use crate::draft::DraftStore;
use crate::log;
use crate::resolve::{Resolved, Resolver};
use crate::store::{ContentStore, FileStore, TimeoutStore};
use crate::sync::SyncOrchestrator;

/// Content store used by every command.
pub type Store = TimeoutStore<FileStore>;

pub fn open_store(config: &DashboardConfig) -> Store {
    TimeoutStore::new(FileStore::new(config.store.path.clone()), config.store.timeout())
}

/// Orchestrator over `store` with the configured timings.
pub fn orchestrator<S: ContentStore>(config: &DashboardConfig, store: S) -> SyncOrchestrator<S> {
    SyncOrchestrator::new(store, DraftStore::shared(config.sync.debounce()))
        .with_retry(config.sync.retry_policy())
        .with_synced_display(config.sync.synced_display())
}

/// Run `future` to completion on a single-threaded runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;
    Ok(rt.block_on(future))
}

/// A resolved dashboard target and the page it lives on.
pub struct Located {
    pub resolved: Resolved,
    pub page: PublishedPage,
}

impl Located {
    pub fn section_key(&self) -> &str {
        &self.resolved.address.section_key
    }
}

/// Resolve `page:section[:subsection]` and fetch the published page.
pub async fn locate<S: ContentStore>(
    sync: &SyncOrchestrator<S>,
    resolver: &Resolver,
    page: &str,
    section: &str,
    subsection: Option<&str>,
) -> Result<Located> {
    let resolved = resolver.resolve_subsection(page, section, subsection);
    if !resolved.mapped {
        log!("resolve"; "no mapping for {}:{}, using {}", page, section, resolved.address);
    }

    let page = sync
        .fetch_page(&resolved.address.page_key)
        .await
        .with_context(|| format!("Failed to load page '{}'", resolved.address.page_key))?;
    Ok(Located { resolved, page })
}
