//! In-memory content store with failure injection, for tests.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tokio::sync::Notify;

use super::file::StoreData;
use super::{ContentStore, StoreError};
use crate::content::{DraftRecord, PublishedPage};

/// Pauses the next `persist_draft` until released.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    /// Signalled when the gated persist call starts.
    pub started: Arc<Notify>,
    /// Notify to let the gated call finish.
    pub release: Arc<Notify>,
}

#[derive(Debug, Default)]
struct State {
    data: StoreData,
    persisted: Vec<DraftRecord>,
    /// Field keys whose persist calls are rejected.
    failing: FxHashSet<String>,
    fail_loads: bool,
    hang_persist: bool,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    gate: Mutex<Option<Gate>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(pages: Vec<PublishedPage>) -> Self {
        let store = Self::default();
        store.state.lock().data.pages = pages;
        store
    }

    pub fn fail_field(&self, field_key: &str) {
        self.state.lock().failing.insert(field_key.to_string());
    }

    pub fn heal_field(&self, field_key: &str) {
        self.state.lock().failing.remove(field_key);
    }

    pub fn fail_loads(&self, fail: bool) {
        self.state.lock().fail_loads = fail;
    }

    pub fn hang_persist(&self, hang: bool) {
        self.state.lock().hang_persist = hang;
    }

    /// Gate the next persist call.
    pub fn install_gate(&self) -> Gate {
        let gate = Gate::default();
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    /// Every successful persist call, in order.
    pub fn persisted(&self) -> Vec<DraftRecord> {
        self.state.lock().persisted.clone()
    }

    pub fn staged(&self) -> Vec<DraftRecord> {
        self.state.lock().data.drafts.clone()
    }

    pub fn seed_draft(&self, record: DraftRecord) {
        self.state.lock().data.stage(&record);
    }

    fn check_loads(&self) -> Result<(), StoreError> {
        if self.state.lock().fail_loads {
            return Err(StoreError::Malformed("injected load failure".into()));
        }
        Ok(())
    }
}

impl ContentStore for MemoryStore {
    async fn fetch_published_content(&self, page_key: &str) -> Result<PublishedPage, StoreError> {
        self.check_loads()?;
        self.state
            .lock()
            .data
            .pages
            .iter()
            .find(|p| p.key == page_key)
            .cloned()
            .ok_or_else(|| StoreError::UnknownPage(page_key.to_string()))
    }

    async fn fetch_drafts(
        &self,
        page_id: &str,
        section_key: &str,
    ) -> Result<Vec<DraftRecord>, StoreError> {
        self.check_loads()?;
        Ok(self
            .state
            .lock()
            .data
            .drafts
            .iter()
            .filter(|d| d.key.in_section(page_id, section_key))
            .cloned()
            .collect())
    }

    async fn persist_draft(&self, record: &DraftRecord) -> Result<(), StoreError> {
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }

        let hang = self.state.lock().hang_persist;
        if hang {
            std::future::pending::<()>().await;
        }

        let mut state = self.state.lock();
        if state.failing.contains(&record.key.field_key) {
            return Err(StoreError::Rejected(format!(
                "{} failed validation",
                record.key.field_key
            )));
        }
        state.persisted.push(record.clone());
        // Unseeded pages are accepted; only seeded ones are updated
        let _ = state.data.apply(&record.key, &record.value);
        Ok(())
    }

    async fn stage_draft(&self, record: &DraftRecord) -> Result<(), StoreError> {
        self.state.lock().data.stage(record);
        Ok(())
    }

    async fn clear_draft(&self, record: &DraftRecord) -> Result<(), StoreError> {
        self.state
            .lock()
            .data
            .drafts
            .retain(|d| d.key != record.key || d.value != record.value);
        Ok(())
    }

    async fn publish(&self, page_id: &str) -> Result<usize, StoreError> {
        self.state.lock().data.promote(page_id)
    }
}
