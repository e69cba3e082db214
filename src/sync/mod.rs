//! Sync Orchestrator
//!
//! Bridges the [`DraftStore`](crate::draft::DraftStore) to a
//! [`ContentStore`]. Owns the [`SyncState`] machine and the retry policy so
//! editor surfaces never deal with timers or retries.
//!
//! # Module Structure
//!
//! - `state` - `SyncPhase` / `SyncState` snapshot
//! - `retry` - Backoff between failed flushes
//! - `runner` - Message loop that turns deadlines into flushes
//!
//! Each field is persisted on its own. A rejected field stays dirty and is
//! retried; its neighbours in the same batch are unaffected.

mod retry;
mod runner;
mod state;


pub use retry::RetryPolicy;
pub use runner::{SyncMsg, SyncRunner};
pub use state::{SyncPhase, SyncState};

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::content::{DraftKey, DraftRecord, PublishedPage};
use crate::draft::{DraftUpdate, FlushOutcome, SharedDrafts};
use crate::store::{ContentStore, StoreError};

/// Outcome of one flush.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FlushReport {
    pub attempted: usize,
    pub persisted: usize,
    /// Persisted, but edited again mid-flight and still dirty.
    pub superseded: usize,
    pub failed: Vec<(DraftKey, String)>,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct SyncOrchestrator<S> {
    store: S,
    drafts: SharedDrafts,
    state: watch::Sender<SyncState>,
    retry: RetryPolicy,
    /// Consecutive failed flushes.
    failures: u32,
    synced_display: Duration,
    /// When `Synced` should fall back to `Idle`.
    settle_at: Option<Instant>,
}

impl<S: ContentStore> SyncOrchestrator<S> {
    pub fn new(store: S, drafts: SharedDrafts) -> Self {
        let pending = drafts.lock().pending_count();
        let (state, _) = watch::channel(SyncState {
            pending,
            ..SyncState::default()
        });
        Self {
            store,
            drafts,
            state,
            retry: RetryPolicy::default(),
            failures: 0,
            synced_display: Duration::from_millis(1500),
            settle_at: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_synced_display(mut self, delay: Duration) -> Self {
        self.synced_display = delay;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn drafts(&self) -> &SharedDrafts {
        &self.drafts
    }

    /// Current state (polling).
    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    fn update_state(&self, f: impl FnOnce(&mut SyncState)) {
        self.state.send_modify(f);
    }

    /// Sync `pending` with the draft store. An `Error` with nothing left to
    /// retry is stale and falls back to `Idle`.
    fn refresh_pending(&self) -> bool {
        let pending = self.drafts.lock().pending_count();
        let mut cleared = false;
        self.state.send_if_modified(|state| {
            let mut changed = state.pending != pending;
            state.pending = pending;
            if pending == 0 && state.phase == SyncPhase::Error {
                state.phase = SyncPhase::Idle;
                state.in_flight = 0;
                state.last_error = None;
                cleared = true;
                changed = true;
            }
            changed
        });
        cleared
    }

    fn report_error(&self, context: &str, err: &StoreError) {
        crate::log!("sync"; "{}: {}", context, err);
        let message = format!("{context}: {err}");
        let pending = self.drafts.lock().pending_count();
        self.update_state(|state| {
            state.phase = SyncPhase::Error;
            state.in_flight = 0;
            state.pending = pending;
            state.last_error = Some(message);
        });
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Published snapshot of a page. A failure is reported as `Error` state.
    pub async fn fetch_page(&self, page_key: &str) -> Result<PublishedPage, StoreError> {
        self.store
            .fetch_published_content(page_key)
            .await
            .inspect_err(|e| self.report_error(&format!("could not load page {page_key}"), e))
    }

    /// Pull staged drafts of one section into the draft store.
    ///
    /// On failure the in-memory drafts are left untouched.
    pub async fn load_drafts(&self, page_id: &str, section_key: &str) -> Result<usize, StoreError> {
        let records = self
            .store
            .fetch_drafts(page_id, section_key)
            .await
            .inspect_err(|e| {
                self.report_error(
                    &format!("could not load drafts for {page_id}/{section_key}"),
                    e,
                )
            })?;

        let added = self.drafts.lock().load_drafts(page_id, section_key, records);
        let _ = self.refresh_pending();
        Ok(added)
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Stage an edit. Persistence happens on the next flush.
    pub fn edit(&self, update: DraftUpdate) -> bool {
        let staged = self.drafts.lock().update_draft(update);
        let _ = self.refresh_pending();
        staged
    }

    /// Journal every pending draft without publishing it, so the edits
    /// survive this process.
    pub async fn stage_pending(&self) -> Result<usize, StoreError> {
        let records: Vec<_> = {
            let drafts = self.drafts.lock();
            drafts
                .iter()
                .map(|(key, draft)| DraftRecord::new(key.clone(), draft.value.clone()))
                .collect()
        };
        for record in &records {
            self.store
                .stage_draft(record)
                .await
                .inspect_err(|e| self.report_error(&format!("could not stage {}", record.key), e))?;
        }
        Ok(records.len())
    }

    // ========================================================================
    // Flushing
    // ========================================================================

    /// Persist every dirty draft, each one independently.
    pub async fn flush(&mut self) -> FlushReport {
        let batch = {
            let mut drafts = self.drafts.lock();
            drafts.debouncer_mut().cancel();
            drafts.begin_flush()
        };
        if batch.is_empty() {
            if self.refresh_pending() {
                self.failures = 0;
            }
            return FlushReport::default();
        }

        let total = batch.len();
        let pending = self.drafts.lock().pending_count();
        self.settle_at = None;
        self.update_state(|state| {
            state.phase = SyncPhase::Syncing;
            state.in_flight = total;
            state.pending = pending;
        });
        crate::debug!("sync"; "flushing {} drafts", total);

        let mut report = FlushReport {
            attempted: total,
            ..FlushReport::default()
        };

        for record in &batch {
            let result = self.store.persist_draft(record).await;
            let outcome = self.drafts.lock().complete_flush(record, result.is_ok());

            match result {
                Ok(()) => {
                    report.persisted += 1;
                    if outcome == FlushOutcome::Superseded {
                        report.superseded += 1;
                    }
                    // Value-matched, so a newer staged edit of the same key survives
                    if let Err(e) = self.store.clear_draft(record).await {
                        crate::debug!("sync"; "could not clear staged {}: {}", record.key, e);
                    }
                }
                Err(err) => {
                    crate::log!("sync"; "failed to save {}: {}", record.key, err);
                    self.stage_current(record).await;
                    report.failed.push((record.key.clone(), err.to_string()));
                }
            }

            self.update_state(|state| state.in_flight = state.in_flight.saturating_sub(1));
        }

        self.finish_flush(&report);
        report
    }

    /// Journal the latest local value of a failed record so it survives a
    /// reload.
    async fn stage_current(&self, record: &DraftRecord) {
        let current = self
            .drafts
            .lock()
            .get_draft_value(&record.key)
            .map(str::to_owned);
        let Some(value) = current else { return };

        let staged = DraftRecord::new(record.key.clone(), value);
        if let Err(e) = self.store.stage_draft(&staged).await {
            crate::debug!("sync"; "could not stage {}: {}", record.key, e);
        }
    }

    fn finish_flush(&mut self, report: &FlushReport) {
        let now = Instant::now();
        let pending = self.drafts.lock().pending_count();

        if report.is_clean() {
            self.failures = 0;
            self.settle_at = Some(now + self.synced_display);
            self.update_state(|state| {
                state.phase = SyncPhase::Synced;
                state.in_flight = 0;
                state.pending = pending;
                state.last_error = None;
            });
            crate::debug!("sync"; "saved {} drafts", report.persisted);
            return;
        }

        self.failures = self.failures.saturating_add(1);
        let delay = self.retry.delay(self.failures);
        self.drafts.lock().debouncer_mut().schedule_at(now + delay);

        let (key, error) = &report.failed[0];
        let message = match report.failed.len() {
            1 => format!("{key}: {error}"),
            n => format!("{key}: {error} (and {} more)", n - 1),
        };
        crate::debug!("sync"; "retrying in {}ms", delay.as_millis());
        self.update_state(|state| {
            state.phase = SyncPhase::Error;
            state.in_flight = 0;
            state.pending = pending;
            state.last_error = Some(message);
        });
    }

    /// When `Synced` is due to fall back to `Idle`.
    pub fn settle_deadline(&self) -> Option<Instant> {
        self.settle_at
    }

    /// `Synced → Idle` once the display delay has passed.
    pub fn settle(&mut self, now: Instant) -> bool {
        match self.settle_at {
            Some(at) if now >= at => {
                self.settle_at = None;
                self.state.send_if_modified(|state| {
                    let synced = state.phase == SyncPhase::Synced;
                    if synced {
                        state.phase = SyncPhase::Idle;
                    }
                    synced
                })
            }
            _ => false,
        }
    }

    // ========================================================================
    // Publishing
    // ========================================================================

    /// Promote a page's drafts to published content.
    ///
    /// Local drafts are journaled first so the publish sees them. On success
    /// the ones that existed when the publish began are discarded.
    pub async fn publish(&mut self, page_id: &str) -> Result<usize, StoreError> {
        let (mark, records) = {
            let drafts = self.drafts.lock();
            (drafts.revision_mark(), drafts.page_records(page_id))
        };

        for record in &records {
            self.store
                .stage_draft(record)
                .await
                .inspect_err(|e| self.report_error(&format!("could not publish {page_id}"), e))?;
        }

        let promoted = self
            .store
            .publish(page_id)
            .await
            .inspect_err(|e| self.report_error(&format!("could not publish {page_id}"), e))?;

        let discarded = self.drafts.lock().discard_page(page_id, mark);
        crate::debug!("sync"; "published {}: {} promoted, {} local drafts cleared",
            page_id, promoted, discarded);
        if self.refresh_pending() {
            self.failures = 0;
        }
        Ok(promoted)
    }
}
