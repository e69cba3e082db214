//! Sync runner
//!
//! Drives a [`SyncOrchestrator`] from a message channel. Edits arrive as
//! messages; flushes happen when the debounce (or retry) deadline passes.
//!
//! ```text
//! editor --SyncMsg--> SyncRunner --flush--> ContentStore
//!                         │
//!                         └──watch──> status line
//! ```

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use super::{SyncOrchestrator, SyncState};
use crate::draft::DraftUpdate;
use crate::store::ContentStore;

const CHANNEL_CAPACITY: usize = 64;

/// Messages to the sync runner
#[derive(Debug)]
pub enum SyncMsg {
    /// Stage an edit and restart the quiet period
    Edit(DraftUpdate),
    /// Flush now, without waiting for the quiet period
    Flush,
    /// Promote a page's drafts to published
    Publish { page_id: String },
    /// Flush what is dirty, then stop
    Shutdown,
}

pub struct SyncRunner<S> {
    orchestrator: SyncOrchestrator<S>,
    rx: mpsc::Receiver<SyncMsg>,
}

impl<S: ContentStore> SyncRunner<S> {
    pub fn new(orchestrator: SyncOrchestrator<S>) -> (Self, mpsc::Sender<SyncMsg>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        (Self { orchestrator, rx }, tx)
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.orchestrator.subscribe()
    }

    /// Run until `Shutdown` or until every sender is dropped.
    ///
    /// Returns the final state. Subscribers see the channel close once this
    /// returns.
    pub async fn run(self) -> SyncState {
        let mut orchestrator = self.orchestrator;
        let mut rx = self.rx;

        loop {
            let sleep = next_wake(&orchestrator, Instant::now());

            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Some(SyncMsg::Edit(update)) => {
                        orchestrator.edit(update);
                    }
                    Some(SyncMsg::Flush) => {
                        orchestrator.flush().await;
                    }
                    Some(SyncMsg::Publish { page_id }) => {
                        match orchestrator.publish(&page_id).await {
                            Ok(n) => crate::log!("publish"; "{}: {} fields published", page_id, n),
                            Err(e) => crate::log!("publish"; "{}: {}", page_id, e),
                        }
                    }
                    Some(SyncMsg::Shutdown) | None => break,
                },
                _ = tokio::time::sleep(sleep) => tick(&mut orchestrator).await,
            }
        }

        let dirty = orchestrator.drafts().lock().dirty_count();
        if dirty > 0 {
            crate::debug!("sync"; "flushing {} drafts before shutdown", dirty);
        }
        // An empty flush still clears an error nothing is left to retry
        orchestrator.flush().await;
        orchestrator.state()
    }
}

/// Time until the earlier of the flush deadline and the settle deadline.
fn next_wake<S: ContentStore>(orchestrator: &SyncOrchestrator<S>, now: Instant) -> Duration {
    let flush = orchestrator.drafts().lock().sleep_duration(now);
    match orchestrator.settle_deadline() {
        Some(at) => flush.min(at.saturating_duration_since(now).max(Duration::from_millis(1))),
        None => flush,
    }
}

async fn tick<S: ContentStore>(orchestrator: &mut SyncOrchestrator<S>) {
    let now = Instant::now();
    let due = orchestrator.drafts().lock().take_flush_due(now);
    if due {
        orchestrator.flush().await;
    }
    orchestrator.settle(Instant::now());
}
