//! Field-group specs and field filtering.

use serde::{Deserialize, Serialize};

use crate::content::FieldMap;

/// Characters treated as a trailing group separator in prefixes.
const SEPARATORS: &[char] = &['.', '_', '-', ':'];

/// Which field keys belong to a UI section/subsection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldGroupSpec {
    /// Exact-match list of field keys.
    Exact { fields: Vec<String> },
    /// Ordered prefixes, written pipe-delimited: `"hero.|meta."`.
    Prefix {
        #[serde(rename = "prefix", with = "pipe_list")]
        prefixes: Vec<String>,
    },
}

impl FieldGroupSpec {
    pub fn exact<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exact {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a prefix spec from its pipe-delimited form.
    pub fn prefix(spec: &str) -> Self {
        Self::Prefix {
            prefixes: split_pipes(spec),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Exact { fields } => fields.is_empty(),
            Self::Prefix { prefixes } => prefixes.is_empty(),
        }
    }

    /// Whether `key` belongs to this group.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Exact { fields } => fields.iter().any(|f| f == key),
            Self::Prefix { prefixes } => prefixes.iter().any(|p| prefix_matches(p, key)),
        }
    }
}

/// `key` starts with `prefix`, or equals `prefix` minus one trailing separator.
///
/// `"meta."` matches both `"meta.title"` and the bare `"meta"` key.
fn prefix_matches(prefix: &str, key: &str) -> bool {
    if key.starts_with(prefix) {
        return true;
    }
    prefix
        .strip_suffix(SEPARATORS)
        .is_some_and(|stem| !stem.is_empty() && key == stem)
}

fn split_pipes(spec: &str) -> Vec<String> {
    spec.split('|')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Keep only the entries of `all` whose key matches `spec`, in input order.
pub fn filter_fields(all: &FieldMap, spec: &FieldGroupSpec) -> FieldMap {
    all.iter()
        .filter(|(key, _)| spec.matches(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

mod pipe_list {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(prefixes: &[String], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&prefixes.join("|"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(super::split_pipes(&raw))
    }
}
