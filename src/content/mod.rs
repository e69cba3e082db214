//! Content data model shared by the resolver, draft store and content store.
//!
//! ```text
//! page ─┬─ section ─┬─ field ("hero.title1") ─┬─ sv
//!       │           │                         ├─ en
//!       │           │                         ├─ de
//!       │           │                         └─ fr
//! ```
//!
//! Published pages are addressed by their human `page_key` ("about").
//! Drafts are addressed by the stable backend `page_id`.

mod language;

pub use language::Language;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Flat `field_key → value` map. Insertion order is preserved
/// (`serde_json` is built with `preserve_order`).
pub type FieldMap = Map<String, Value>;

// ============================================================================
// ContentAddress
// ============================================================================

/// Backend address of a row group: `(page_key, section_key)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentAddress {
    pub page_key: String,
    pub section_key: String,
}

impl ContentAddress {
    pub fn new(page_key: impl Into<String>, section_key: impl Into<String>) -> Self {
        Self {
            page_key: page_key.into(),
            section_key: section_key.into(),
        }
    }

    /// Parse `"page/section"` notation used in config files.
    pub fn parse(s: &str) -> Option<Self> {
        let (page, section) = s.split_once('/')?;
        let (page, section) = (page.trim(), section.trim());
        if page.is_empty() || section.is_empty() || section.contains('/') {
            return None;
        }
        Some(Self::new(page, section))
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.page_key, self.section_key)
    }
}

// ============================================================================
// DraftKey / DraftRecord
// ============================================================================

/// Identity of one editable field in one language.
///
/// The tuple is unique in the content store, so it doubles as the row
/// identity for idempotent upserts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DraftKey {
    pub page_id: String,
    pub section_key: String,
    pub field_key: String,
    pub language: Language,
}

impl DraftKey {
    pub fn new(
        page_id: impl Into<String>,
        section_key: impl Into<String>,
        field_key: impl Into<String>,
        language: Language,
    ) -> Self {
        Self {
            page_id: page_id.into(),
            section_key: section_key.into(),
            field_key: field_key.into(),
            language,
        }
    }

    pub fn in_section(&self, page_id: &str, section_key: &str) -> bool {
        self.page_id == page_id && self.section_key == section_key
    }
}

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}[{}]",
            self.page_id, self.section_key, self.field_key, self.language
        )
    }
}

/// Snapshot of a staged edit as exchanged with the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRecord {
    #[serde(flatten)]
    pub key: DraftKey,
    pub value: String,
    /// Local revision the snapshot was taken at. Zero for records that
    /// came from the store.
    #[serde(default, skip_serializing)]
    pub revision: u64,
}

impl DraftRecord {
    pub fn new(key: DraftKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
            revision: 0,
        }
    }
}

// ============================================================================
// PublishedPage
// ============================================================================

/// Read-only snapshot of a page's published content.
///
/// Each field value is an object of `language → value`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishedPage {
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub sections: Map<String, Value>,
}

impl PublishedPage {
    /// Fields of one section, empty when the section has no content.
    pub fn section(&self, section_key: &str) -> FieldMap {
        match self.sections.get(section_key) {
            Some(Value::Object(fields)) => fields.clone(),
            _ => FieldMap::new(),
        }
    }

    /// Published value for one field/language, if it is a plain string.
    pub fn text(&self, section_key: &str, field_key: &str, language: Language) -> Option<&str> {
        self.sections
            .get(section_key)?
            .get(field_key)?
            .get(language.code())?
            .as_str()
    }
}

/// Draft-if-present, else published.
pub fn effective_value<'a>(draft: Option<&'a str>, published: &'a str) -> &'a str {
    draft.unwrap_or(published)
}
