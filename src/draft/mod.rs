//! Draft Store
//!
//! Buffers edits per field/language so the content store is not written on
//! every keystroke. Edits overwrite in place. Each write bumps a revision,
//! which lets a flush that completes late tell whether the user typed again
//! while it was in flight.
//!
//! ```text
//! update_draft ──► Dirty ──begin_flush──► InFlight ──complete_flush(ok, same rev)──► (removed)
//!                    ▲                       │
//!                    └───── failed / edited again while in flight
//! ```
//!
//! The store is synchronous. Timing lives in [`Debouncer`] as a plain
//! deadline value; the sync runner decides when to act on it.

mod debouncer;

pub use debouncer::{DEBOUNCE_MS, Debouncer};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::content::{DraftKey, DraftRecord, Language};

/// Draft store shared between editor surfaces and the sync orchestrator.
pub type SharedDrafts = Arc<Mutex<DraftStore>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftStatus {
    /// Not yet sent to the content store.
    Dirty,
    /// Sent, outcome pending.
    InFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub value: String,
    pub status: DraftStatus,
    pub revision: u64,
}

/// One edit as issued by an editor surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftUpdate {
    pub key: DraftKey,
    pub value: String,
    /// Currently published value, when the surface knows it.
    pub published: Option<String>,
}

impl DraftUpdate {
    pub fn new(
        page_id: impl Into<String>,
        section_key: impl Into<String>,
        field_key: impl Into<String>,
        language: Language,
        value: impl Into<String>,
    ) -> Self {
        Self {
            key: DraftKey::new(page_id, section_key, field_key, language),
            value: value.into(),
            published: None,
        }
    }

    pub fn with_published(mut self, published: impl Into<String>) -> Self {
        self.published = Some(published.into());
        self
    }
}

/// What `complete_flush` did with a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Persisted and removed.
    Cleared,
    /// Edited again while in flight; stays dirty with the newer value.
    Superseded,
    /// Persist failed; back to dirty.
    Retained,
    /// No such draft (discarded while in flight).
    Missing,
}

#[derive(Debug, Default)]
pub struct DraftStore {
    drafts: BTreeMap<DraftKey, Draft>,
    debouncer: Debouncer,
    revision: u64,
}

impl DraftStore {
    pub fn new(debounce: Duration) -> Self {
        Self {
            drafts: BTreeMap::new(),
            debouncer: Debouncer::new(debounce),
            revision: 0,
        }
    }

    pub fn shared(debounce: Duration) -> SharedDrafts {
        Arc::new(Mutex::new(Self::new(debounce)))
    }

    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    /// Latest revision handed out. Drafts at or below it existed when the
    /// mark was taken.
    pub fn revision_mark(&self) -> u64 {
        self.revision
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Populate the index from previously staged records of one section.
    ///
    /// Idempotent: keys already held locally keep their (newer) value, so
    /// repeated loads neither duplicate nor clobber. Records outside
    /// `(page_id, section_key)` are ignored. Returns how many were added.
    pub fn load_drafts(&mut self, page_id: &str, section_key: &str, records: Vec<DraftRecord>) -> usize {
        let mut added = 0;
        for record in records {
            if !record.key.in_section(page_id, section_key) || self.drafts.contains_key(&record.key) {
                continue;
            }
            let revision = self.next_revision();
            self.drafts.insert(
                record.key,
                Draft {
                    value: record.value,
                    status: DraftStatus::Dirty,
                    revision,
                },
            );
            added += 1;
        }
        if added > 0 {
            crate::debug!("draft"; "loaded {} staged drafts for {}/{}", added, page_id, section_key);
        }
        added
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Upsert one draft and push the flush deadline out.
    ///
    /// Returns `false` when nothing was staged: the value equals the
    /// published one and there is no draft to overwrite.
    pub fn update_draft(&mut self, update: DraftUpdate) -> bool {
        self.update_draft_at(update, Instant::now())
    }

    pub fn update_draft_at(&mut self, update: DraftUpdate, now: Instant) -> bool {
        let DraftUpdate {
            key,
            value,
            published,
        } = update;

        if !self.drafts.contains_key(&key) && published.as_deref() == Some(value.as_str()) {
            return false;
        }

        let revision = self.next_revision();
        self.drafts.insert(
            key,
            Draft {
                value,
                status: DraftStatus::Dirty,
                revision,
            },
        );
        self.debouncer.touch(now);
        true
    }

    pub fn get_draft_value(&self, key: &DraftKey) -> Option<&str> {
        self.drafts.get(key).map(|d| d.value.as_str())
    }

    pub fn has_draft(&self, key: &DraftKey) -> bool {
        self.drafts.contains_key(key)
    }

    pub fn get(&self, key: &DraftKey) -> Option<&Draft> {
        self.drafts.get(key)
    }

    /// Drop a page's drafts after a publish superseded them.
    ///
    /// Drafts edited after `through_revision` are newer than what was
    /// published and survive.
    pub fn discard_page(&mut self, page_id: &str, through_revision: u64) -> usize {
        let before = self.drafts.len();
        self.drafts
            .retain(|key, draft| key.page_id != page_id || draft.revision > through_revision);
        before - self.drafts.len()
    }

    /// Pending drafts of one page as records, without changing their status.
    pub fn page_records(&self, page_id: &str) -> Vec<DraftRecord> {
        self.drafts
            .iter()
            .filter(|(key, _)| key.page_id == page_id)
            .map(|(key, draft)| record_of(key, draft))
            .collect()
    }

    // ========================================================================
    // Flushing
    // ========================================================================

    /// Snapshot every dirty draft and mark it in flight.
    ///
    /// Drafts already in flight belong to another flush and are skipped.
    pub fn begin_flush(&mut self) -> Vec<DraftRecord> {
        self.drafts
            .iter_mut()
            .filter(|(_, draft)| draft.status == DraftStatus::Dirty)
            .map(|(key, draft)| {
                draft.status = DraftStatus::InFlight;
                record_of(key, draft)
            })
            .collect()
    }

    /// Settle one record of a flush.
    ///
    /// The draft is only removed if it still holds the revision that was
    /// sent. Anything else means the user edited it mid-flight.
    pub fn complete_flush(&mut self, record: &DraftRecord, persisted: bool) -> FlushOutcome {
        let Some(draft) = self.drafts.get_mut(&record.key) else {
            return FlushOutcome::Missing;
        };

        if draft.revision != record.revision {
            // A newer edit already set the draft back to dirty
            return FlushOutcome::Superseded;
        }

        if persisted {
            self.drafts.remove(&record.key);
            FlushOutcome::Cleared
        } else {
            draft.status = DraftStatus::Dirty;
            FlushOutcome::Retained
        }
    }

    // ========================================================================
    // Counts & scheduling
    // ========================================================================

    /// Drafts not yet confirmed persisted (dirty or in flight).
    pub fn pending_count(&self) -> usize {
        self.drafts.len()
    }

    pub fn dirty_count(&self) -> usize {
        self.drafts
            .values()
            .filter(|d| d.status == DraftStatus::Dirty)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DraftKey, &Draft)> {
        self.drafts.iter()
    }

    /// Pending flush deadline, if any.
    pub fn flush_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn debouncer_mut(&mut self) -> &mut Debouncer {
        &mut self.debouncer
    }

    /// Consume the flush deadline if it has passed.
    pub fn take_flush_due(&mut self, now: Instant) -> bool {
        self.debouncer.take_if_due(now)
    }

    pub fn sleep_duration(&self, now: Instant) -> Duration {
        self.debouncer.sleep_duration(now)
    }
}

fn record_of(key: &DraftKey, draft: &Draft) -> DraftRecord {
    DraftRecord {
        key: key.clone(),
        value: draft.value.clone(),
        revision: draft.revision,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(field: &str) -> DraftKey {
        DraftKey::new("page-1", "hero", field, Language::En)
    }

    fn update(field: &str, value: &str) -> DraftUpdate {
        DraftUpdate::new("page-1", "hero", field, Language::En, value)
    }

    #[test]
    fn test_overwrite_keeps_single_latest_entry() {
        let mut store = DraftStore::default();
        assert!(store.update_draft(update("hero.title", "first")));
        assert!(store.update_draft(update("hero.title", "second")));

        assert_eq!(store.pending_count(), 1);
        assert_eq!(store.get_draft_value(&key("hero.title")), Some("second"));
    }

    #[test]
    fn test_unknown_key_is_none() {
        let store = DraftStore::default();
        assert_eq!(store.get_draft_value(&key("nope")), None);
        assert!(!store.has_draft(&key("nope")));
    }

    #[test]
    fn test_value_equal_to_published_is_not_staged() {
        let mut store = DraftStore::default();
        let unchanged = update("hero.title", "Same").with_published("Same");
        assert!(!store.update_draft(unchanged));
        assert!(!store.has_draft(&key("hero.title")));
        assert!(store.flush_deadline().is_none());

        // Reverting an existing draft to the published value still stages it
        store.update_draft(update("hero.title", "Changed"));
        assert!(store.update_draft(update("hero.title", "Same").with_published("Same")));
        assert_eq!(store.get_draft_value(&key("hero.title")), Some("Same"));
    }

    #[test]
    fn test_update_arms_debounce() {
        let mut store = DraftStore::new(Duration::from_millis(100));
        let t0 = Instant::now();
        store.update_draft_at(update("hero.title", "x"), t0);

        assert_eq!(store.flush_deadline(), Some(t0 + Duration::from_millis(100)));
        assert!(!store.take_flush_due(t0));
        assert!(store.take_flush_due(t0 + Duration::from_millis(100)));
    }

    #[test]
    fn test_load_is_idempotent_and_keeps_local_edits() {
        let mut store = DraftStore::default();
        store.update_draft(update("hero.title", "local"));

        let records = vec![
            DraftRecord::new(key("hero.title"), "stale"),
            DraftRecord::new(key("hero.sub"), "staged"),
            DraftRecord::new(DraftKey::new("page-1", "other", "x", Language::En), "ignored"),
        ];

        assert_eq!(store.load_drafts("page-1", "hero", records.clone()), 1);
        assert_eq!(store.load_drafts("page-1", "hero", records), 0);

        assert_eq!(store.pending_count(), 2);
        assert_eq!(store.get_draft_value(&key("hero.title")), Some("local"));
        assert_eq!(store.get_draft_value(&key("hero.sub")), Some("staged"));
    }

    #[test]
    fn test_flush_clears_on_success() {
        let mut store = DraftStore::default();
        store.update_draft(update("hero.title", "v1"));

        let batch = store.begin_flush();
        assert_eq!(batch.len(), 1);
        assert_eq!(store.get(&key("hero.title")).unwrap().status, DraftStatus::InFlight);

        assert_eq!(store.complete_flush(&batch[0], true), FlushOutcome::Cleared);
        assert_eq!(store.get_draft_value(&key("hero.title")), None);
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn test_edit_during_flush_survives_success() {
        let mut store = DraftStore::default();
        store.update_draft(update("hero.title", "v1"));
        let batch = store.begin_flush();

        store.update_draft(update("hero.title", "v2"));
        assert_eq!(store.complete_flush(&batch[0], true), FlushOutcome::Superseded);

        let draft = store.get(&key("hero.title")).unwrap();
        assert_eq!(draft.value, "v2");
        assert_eq!(draft.status, DraftStatus::Dirty);
    }

    #[test]
    fn test_failed_flush_returns_to_dirty() {
        let mut store = DraftStore::default();
        store.update_draft(update("hero.title", "v1"));
        let batch = store.begin_flush();

        assert_eq!(store.complete_flush(&batch[0], false), FlushOutcome::Retained);
        assert_eq!(store.dirty_count(), 1);
        assert_eq!(store.begin_flush().len(), 1);
    }

    #[test]
    fn test_in_flight_skipped_by_second_flush() {
        let mut store = DraftStore::default();
        store.update_draft(update("a", "1"));
        let first = store.begin_flush();
        store.update_draft(update("b", "2"));

        let second = store.begin_flush();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].key, key("b"));
    }

    #[test]
    fn test_discard_page_respects_mark() {
        let mut store = DraftStore::default();
        store.update_draft(update("a", "1"));
        store.update_draft(DraftUpdate::new("page-2", "hero", "a", Language::En, "x"));
        let mark = store.revision_mark();
        store.update_draft(update("b", "after publish"));

        assert_eq!(store.discard_page("page-1", mark), 1);
        assert!(!store.has_draft(&key("a")));
        assert!(store.has_draft(&key("b")));
        assert_eq!(store.pending_count(), 2);
    }

    #[test]
    fn test_complete_missing_draft() {
        let mut store = DraftStore::default();
        store.update_draft(update("a", "1"));
        let batch = store.begin_flush();
        // Published while the flush was in flight
        store.discard_page("page-1", store.revision_mark());
        assert_eq!(store.complete_flush(&batch[0], true), FlushOutcome::Missing);
    }
}
