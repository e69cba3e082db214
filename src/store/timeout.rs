//! Request timeout at the store boundary.

use std::future::Future;
use std::time::Duration;

use super::{ContentStore, StoreError};
use crate::content::{DraftRecord, PublishedPage};

/// Bounds every call of the inner store. A hung request surfaces as
/// [`StoreError::Timeout`] instead of leaving a flush stuck in `syncing`.
#[derive(Debug, Clone)]
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimeoutStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }
}

impl<S: ContentStore> ContentStore for TimeoutStore<S> {
    async fn fetch_published_content(&self, page_key: &str) -> Result<PublishedPage, StoreError> {
        self.bounded(self.inner.fetch_published_content(page_key))
            .await
    }

    async fn fetch_drafts(
        &self,
        page_id: &str,
        section_key: &str,
    ) -> Result<Vec<DraftRecord>, StoreError> {
        self.bounded(self.inner.fetch_drafts(page_id, section_key))
            .await
    }

    async fn persist_draft(&self, record: &DraftRecord) -> Result<(), StoreError> {
        self.bounded(self.inner.persist_draft(record)).await
    }

    async fn stage_draft(&self, record: &DraftRecord) -> Result<(), StoreError> {
        self.bounded(self.inner.stage_draft(record)).await
    }

    async fn clear_draft(&self, record: &DraftRecord) -> Result<(), StoreError> {
        self.bounded(self.inner.clear_draft(record)).await
    }

    async fn publish(&self, page_id: &str) -> Result<usize, StoreError> {
        self.bounded(self.inner.publish(page_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{DraftKey, Language};
    use crate::store::memory::MemoryStore;

    #[tokio::test(start_paused = true)]
    async fn test_hung_call_times_out() {
        let memory = MemoryStore::new();
        memory.hang_persist(true);
        let store = TimeoutStore::new(memory, Duration::from_millis(500));

        let record = DraftRecord::new(DraftKey::new("p", "s", "f", Language::En), "v");
        let err = store.persist_draft(&record).await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout(d) if d == Duration::from_millis(500)));
        assert_eq!(err.to_string(), "request timed out after 500ms");
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let store = TimeoutStore::new(MemoryStore::new(), Duration::from_secs(5));
        let record = DraftRecord::new(DraftKey::new("p", "s", "f", Language::En), "v");
        store.persist_draft(&record).await.unwrap();
        assert_eq!(store.inner().persisted().len(), 1);
    }
}
