//! JSON-file content store.
//!
//! Local stand-in for the hosted backend: one file holding the seeded
//! pages and the staged-draft journal.
//!
//! ```json
//! {
//!   "pages": [
//!     { "id": "page-home", "key": "home",
//!       "sections": { "hero": { "hero.title1": { "sv": "…", "en": "…" } } } }
//!   ],
//!   "drafts": [
//!     { "page_id": "page-home", "section_key": "hero",
//!       "field_key": "hero.title1", "language": "en", "value": "…" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ContentStore, StoreError};
use crate::content::{DraftKey, DraftRecord, PublishedPage};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub pages: Vec<PublishedPage>,
    #[serde(default)]
    pub drafts: Vec<DraftRecord>,
}

impl StoreData {
    pub(super) fn page_by_id_mut(&mut self, page_id: &str) -> Result<&mut PublishedPage, StoreError> {
        self.pages
            .iter_mut()
            .find(|p| p.id == page_id)
            .ok_or_else(|| StoreError::UnknownPage(page_id.to_string()))
    }

    /// Write one value into a page's published content.
    pub(super) fn apply(&mut self, key: &DraftKey, value: &str) -> Result<(), StoreError> {
        let page = self.page_by_id_mut(&key.page_id)?;

        let section = object_entry(&mut page.sections, &key.section_key)?;
        let field = object_entry(section, &key.field_key)?;
        field.insert(key.language.code().to_string(), Value::String(value.to_string()));
        Ok(())
    }

    /// Move a page's staged drafts into its published content.
    pub(super) fn promote(&mut self, page_id: &str) -> Result<usize, StoreError> {
        self.page_by_id_mut(page_id)?;

        let (promoted, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.drafts)
            .into_iter()
            .partition(|d| d.key.page_id == page_id);
        self.drafts = kept;

        for record in &promoted {
            self.apply(&record.key, &record.value)?;
        }
        Ok(promoted.len())
    }

    pub(super) fn stage(&mut self, record: &DraftRecord) {
        match self.drafts.iter_mut().find(|d| d.key == record.key) {
            Some(existing) => existing.value.clone_from(&record.value),
            None => self.drafts.push(DraftRecord::new(record.key.clone(), record.value.clone())),
        }
    }
}

/// Get or create `map[key]` as an object.
fn object_entry<'a>(
    map: &'a mut Map<String, Value>,
    key: &str,
) -> Result<&'a mut Map<String, Value>, StoreError> {
    map.entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| StoreError::Malformed(format!("`{key}` is not an object")))
}

/// Content store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the store file with `pages` unless it already exists.
    pub fn init(&self, pages: Vec<PublishedPage>) -> Result<bool, StoreError> {
        if self.path.exists() {
            return Ok(false);
        }
        self.write(&StoreData {
            pages,
            drafts: Vec::new(),
        })?;
        Ok(true)
    }

    pub fn read(&self) -> Result<StoreData, StoreError> {
        if !self.path.exists() {
            return Ok(StoreData::default());
        }
        let json =
            fs::read_to_string(&self.path).map_err(|e| StoreError::Io(self.path.clone(), e))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Write atomically (temp file + rename), skipping identical content.
    fn write(&self, data: &StoreData) -> Result<(), StoreError> {
        let io_err = |e| StoreError::Io(self.path.clone(), e);
        let json = serde_json::to_string_pretty(data)?;

        if file_content_matches(&self.path, &json) {
            crate::debug!("store"; "content unchanged, skipping write");
            return Ok(());
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }

    fn modify<T>(
        &self,
        f: impl FnOnce(&mut StoreData) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut data = self.read()?;
        let out = f(&mut data)?;
        self.write(&data)?;
        Ok(out)
    }

    /// Every staged draft, across pages.
    pub fn all_drafts(&self) -> Result<Vec<DraftRecord>, StoreError> {
        Ok(self.read()?.drafts)
    }
}

/// Check if file content is the same as new content
fn file_content_matches(path: &Path, content: &str) -> bool {
    path.exists() && fs::read_to_string(path).is_ok_and(|existing| existing == content)
}

impl ContentStore for FileStore {
    async fn fetch_published_content(&self, page_key: &str) -> Result<PublishedPage, StoreError> {
        self.read()?
            .pages
            .into_iter()
            .find(|p| p.key == page_key)
            .ok_or_else(|| StoreError::UnknownPage(page_key.to_string()))
    }

    async fn fetch_drafts(
        &self,
        page_id: &str,
        section_key: &str,
    ) -> Result<Vec<DraftRecord>, StoreError> {
        Ok(self
            .read()?
            .drafts
            .into_iter()
            .filter(|d| d.key.in_section(page_id, section_key))
            .collect())
    }

    async fn persist_draft(&self, record: &DraftRecord) -> Result<(), StoreError> {
        self.modify(|data| data.apply(&record.key, &record.value))
    }

    async fn stage_draft(&self, record: &DraftRecord) -> Result<(), StoreError> {
        self.modify(|data| {
            data.stage(record);
            Ok(())
        })
    }

    async fn clear_draft(&self, record: &DraftRecord) -> Result<(), StoreError> {
        self.modify(|data| {
            data.drafts
                .retain(|d| d.key != record.key || d.value != record.value);
            Ok(())
        })
    }

    async fn publish(&self, page_id: &str) -> Result<usize, StoreError> {
        let count = self.modify(|data| data.promote(page_id))?;
        crate::debug!("store"; "published {} drafts for {}", count, page_id);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Language;
    use serde_json::json;
    use tempfile::TempDir;

    fn seeded() -> (TempDir, FileStore) {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("store").join("content.json"));
        let page: PublishedPage = serde_json::from_value(json!({
            "id": "page-about",
            "key": "about",
            "sections": { "hero": { "hero.title": { "sv": "Om oss", "en": "About us" } } }
        }))
        .unwrap();
        assert!(store.init(vec![page]).unwrap());
        (temp, store)
    }

    fn record(field: &str, lang: Language, value: &str) -> DraftRecord {
        DraftRecord::new(DraftKey::new("page-about", "hero", field, lang), value)
    }

    #[tokio::test]
    async fn test_fetch_published() {
        let (_temp, store) = seeded();
        let page = store.fetch_published_content("about").await.unwrap();
        assert_eq!(page.id, "page-about");
        assert_eq!(page.text("hero", "hero.title", Language::Sv), Some("Om oss"));

        let missing = store.fetch_published_content("nope").await;
        assert!(matches!(missing, Err(StoreError::UnknownPage(_))));
    }

    #[tokio::test]
    async fn test_persist_is_idempotent_upsert() {
        let (_temp, store) = seeded();
        let rec = record("hero.title", Language::En, "Who we are");

        store.persist_draft(&rec).await.unwrap();
        store.persist_draft(&rec).await.unwrap();

        let page = store.fetch_published_content("about").await.unwrap();
        assert_eq!(page.text("hero", "hero.title", Language::En), Some("Who we are"));
        assert_eq!(page.text("hero", "hero.title", Language::Sv), Some("Om oss"));
        assert_eq!(page.section("hero").len(), 1);
    }

    #[tokio::test]
    async fn test_persist_unknown_page_rejected() {
        let (_temp, store) = seeded();
        let rec = DraftRecord::new(DraftKey::new("ghost", "hero", "x", Language::En), "v");
        assert!(matches!(
            store.persist_draft(&rec).await,
            Err(StoreError::UnknownPage(_))
        ));
    }

    #[tokio::test]
    async fn test_stage_fetch_clear() {
        let (_temp, store) = seeded();
        store.stage_draft(&record("hero.title", Language::En, "one")).await.unwrap();
        store.stage_draft(&record("hero.title", Language::En, "two")).await.unwrap();
        store.stage_draft(&record("hero.sub", Language::Sv, "under")).await.unwrap();

        let drafts = store.fetch_drafts("page-about", "hero").await.unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].value, "two");
        assert!(store.fetch_drafts("page-about", "other").await.unwrap().is_empty());

        // Stale value does not clear the newer staged edit
        store.clear_draft(&record("hero.title", Language::En, "one")).await.unwrap();
        assert_eq!(store.all_drafts().unwrap().len(), 2);

        store.clear_draft(&record("hero.title", Language::En, "two")).await.unwrap();
        assert_eq!(store.all_drafts().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_publish_promotes_page_drafts() {
        let (_temp, store) = seeded();
        store.stage_draft(&record("hero.title", Language::De, "Über uns")).await.unwrap();
        store
            .stage_draft(&DraftRecord::new(
                DraftKey::new("page-home", "hero", "x", Language::En),
                "other page",
            ))
            .await
            .unwrap();

        assert_eq!(store.publish("page-about").await.unwrap(), 1);

        let page = store.fetch_published_content("about").await.unwrap();
        assert_eq!(page.text("hero", "hero.title", Language::De), Some("Über uns"));
        assert_eq!(store.all_drafts().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("content.json");
        fs::write(&path, "{ not json").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(
            store.fetch_published_content("about").await,
            Err(StoreError::Malformed(_))
        ));
    }

    #[test]
    fn test_init_does_not_overwrite() {
        let (_temp, store) = seeded();
        assert!(!store.init(Vec::new()).unwrap());
        assert_eq!(store.read().unwrap().pages.len(), 1);
    }
}
