//! Content Store boundary.
//!
//! The hosted backend is reduced to this narrow contract. Everything
//! behind it (auth, row-level security, wire protocol) is opaque.
//!
//! | Operation                 | Effect                                            |
//! |---------------------------|---------------------------------------------------|
//! | `fetch_published_content` | Snapshot of a page's published values             |
//! | `fetch_drafts`            | Staged, unflushed edits of one section            |
//! | `persist_draft`           | Idempotent upsert of one field/language value     |
//! | `stage_draft`             | Keep an unflushed edit across reloads             |
//! | `clear_draft`             | Drop a staged edit once superseded                |
//! | `publish`                 | Promote a page's staged edits to published        |
//!
//! Implementations convert every failure, including malformed data, into
//! a [`StoreError`]. Nothing panics across this boundary.

mod file;
#[cfg(test)]
pub mod memory;
mod timeout;

pub use file::FileStore;
pub use timeout::TimeoutStore;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::content::{DraftRecord, PublishedPage};

/// Content store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error when accessing `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("malformed store data: {0}")]
    Malformed(String),

    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("write rejected: {0}")]
    Rejected(String),

    #[error("unknown page `{0}`")]
    UnknownPage(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Narrow read/write contract over the content backend.
#[allow(async_fn_in_trait)]
pub trait ContentStore {
    async fn fetch_published_content(&self, page_key: &str) -> Result<PublishedPage, StoreError>;

    async fn fetch_drafts(
        &self,
        page_id: &str,
        section_key: &str,
    ) -> Result<Vec<DraftRecord>, StoreError>;

    /// Upsert, never insert: repeating a succeeded write is a no-op.
    async fn persist_draft(&self, record: &DraftRecord) -> Result<(), StoreError>;

    async fn stage_draft(&self, record: &DraftRecord) -> Result<(), StoreError>;

    /// Only removes the staged edit if it still holds `record.value`.
    async fn clear_draft(&self, record: &DraftRecord) -> Result<(), StoreError>;

    /// Returns how many staged edits were promoted.
    async fn publish(&self, page_id: &str) -> Result<usize, StoreError>;
}

impl<S: ContentStore> ContentStore for Arc<S> {
    async fn fetch_published_content(&self, page_key: &str) -> Result<PublishedPage, StoreError> {
        (**self).fetch_published_content(page_key).await
    }

    async fn fetch_drafts(
        &self,
        page_id: &str,
        section_key: &str,
    ) -> Result<Vec<DraftRecord>, StoreError> {
        (**self).fetch_drafts(page_id, section_key).await
    }

    async fn persist_draft(&self, record: &DraftRecord) -> Result<(), StoreError> {
        (**self).persist_draft(record).await
    }

    async fn stage_draft(&self, record: &DraftRecord) -> Result<(), StoreError> {
        (**self).stage_draft(record).await
    }

    async fn clear_draft(&self, record: &DraftRecord) -> Result<(), StoreError> {
        (**self).clear_draft(record).await
    }

    async fn publish(&self, page_id: &str) -> Result<usize, StoreError> {
        (**self).publish(page_id).await
    }
}
