//! Content key resolution.
//!
//! Translates the dashboard's page/section/subsection taxonomy into
//! content store addresses and narrows a section's fields to what one
//! editor panel shows.
//!
//! ```text
//! ("home", "hero", Some("titles"))
//!     │ MappingTable      → ContentAddress { home, hero }
//!     │ group specs       → FieldGroupSpec::Prefix ["hero.title", ...]
//!     ▼
//! filter_fields(section, spec) → resolve_value(field, lang)
//! ```
//!
//! Every lookup is total: unknown pairs resolve to `hero/hero`, unknown
//! subsections show the whole section, missing languages render empty.

mod filter;
mod index;
mod mapping;
mod value;

pub use filter::{FieldGroupSpec, filter_fields};
pub use index::FieldIndex;
pub use mapping::{MappingTable, mapping_key};
pub use value::resolve_value;

use rustc_hash::FxHashMap;

use crate::config::DashboardConfig;
use crate::content::{ContentAddress, FieldMap, Language};

/// Built-in subsection groups: `(page, section, subsection, prefix spec)`.
const BUILTIN_GROUPS: &[(&str, &str, &str, &str)] = &[
    ("home", "hero", "titles", "hero.title|hero.subtitle"),
    ("home", "hero", "buttons", "hero.cta.|hero.button"),
    ("home", "hero", "meta", "meta."),
    ("experiences", "packages", "list", "packages.|package."),
    ("experiences", "packages", "pricing", "price.|pricing."),
    ("contact", "info", "address", "address.|phone|email"),
];

/// Where a UI subsection lives and which of its fields to show.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub address: ContentAddress,
    /// `false` when the address is the fallback.
    pub mapped: bool,
    pub group: Option<FieldGroupSpec>,
}

/// Resolver over immutable tables.
#[derive(Debug, Clone)]
pub struct Resolver {
    mappings: MappingTable,
    groups: FxHashMap<String, FieldGroupSpec>,
    default_language: Language,
}

impl Resolver {
    pub fn new(
        mappings: MappingTable,
        groups: FxHashMap<String, FieldGroupSpec>,
        default_language: Language,
    ) -> Self {
        let mut all: FxHashMap<_, _> = BUILTIN_GROUPS
            .iter()
            .map(|(page, section, sub, spec)| {
                (group_key(page, section, sub), FieldGroupSpec::prefix(spec))
            })
            .collect();
        for (key, spec) in groups {
            all.insert(key.trim().to_lowercase(), spec);
        }
        Self {
            mappings,
            groups: all,
            default_language,
        }
    }

    pub fn builtin() -> Self {
        Self::new(
            MappingTable::builtin(),
            FxHashMap::default(),
            Language::default(),
        )
    }

    /// Build from the `[mapping]`, `[groups]` and `[content]` config sections.
    pub fn from_config(config: &DashboardConfig) -> Self {
        // Invalid entries are rejected by config validation
        let mappings = MappingTable::with_overrides(
            config
                .mapping
                .iter()
                .filter_map(|(key, value)| Some((key.as_str(), ContentAddress::parse(value)?))),
        );
        Self::new(
            mappings,
            config.groups.clone().into_iter().collect(),
            config.content.default_language,
        )
    }

    pub fn default_language(&self) -> Language {
        self.default_language
    }

    /// Address for a page/section pair, falling back to `hero/hero`.
    pub fn resolve_mapping(&self, page_slug: &str, section_slug: &str) -> ContentAddress {
        self.mappings.resolve(page_slug, section_slug)
    }

    /// Address plus the optional subsection group.
    pub fn resolve_subsection(
        &self,
        page_slug: &str,
        section_slug: &str,
        subsection: Option<&str>,
    ) -> Resolved {
        let mapped = self.mappings.lookup(page_slug, section_slug).cloned();
        let group = subsection
            .and_then(|sub| self.groups.get(&group_key(page_slug, section_slug, sub)))
            .cloned();
        Resolved {
            mapped: mapped.is_some(),
            address: mapped.unwrap_or_else(|| self.mappings.resolve(page_slug, section_slug)),
            group,
        }
    }

    /// Apply an optional group to a section's fields.
    pub fn visible_fields(&self, fields: &FieldMap, group: Option<&FieldGroupSpec>) -> FieldMap {
        match group {
            Some(spec) => filter_fields(fields, spec),
            None => fields.clone(),
        }
    }

    /// Text of a field in `language`, using the configured default language.
    pub fn field_text(&self, field_data: &serde_json::Value, language: Language) -> String {
        resolve_value(field_data, language, self.default_language)
    }

    /// Group index for a section, covering the section's subsections.
    pub fn index(&self, page_slug: &str, section_slug: &str, fields: &FieldMap) -> FieldIndex {
        let prefix = format!("{}:", mapping_key(page_slug, section_slug));
        FieldIndex::build(
            fields,
            self.groups
                .iter()
                .filter_map(|(key, spec)| Some((key.strip_prefix(&prefix)?, spec))),
        )
    }
}

fn group_key(page: &str, section: &str, subsection: &str) -> String {
    format!(
        "{}:{}",
        mapping_key(page, section),
        subsection.trim().to_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::mapping::fallback_address;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_subsection_with_group() {
        let resolver = Resolver::builtin();
        let resolved = resolver.resolve_subsection("home", "hero", Some("titles"));

        assert!(resolved.mapped);
        assert_eq!(resolved.address, ContentAddress::new("home", "hero"));
        assert_eq!(
            resolved.group,
            Some(FieldGroupSpec::prefix("hero.title|hero.subtitle"))
        );
    }

    #[test]
    fn test_resolve_subsection_unmapped() {
        let resolver = Resolver::builtin();
        let resolved = resolver.resolve_subsection("pricing", "table", None);

        assert!(!resolved.mapped);
        assert_eq!(resolved.address, fallback_address());
        assert!(resolved.group.is_none());
    }

    #[test]
    fn test_config_groups_override_builtin() {
        let mut groups = FxHashMap::default();
        groups.insert(
            "Home:Hero:Titles".to_string(),
            FieldGroupSpec::exact(["hero.title1"]),
        );
        let resolver = Resolver::new(MappingTable::builtin(), groups, Language::Sv);

        let resolved = resolver.resolve_subsection("home", "hero", Some("titles"));
        assert_eq!(resolved.group, Some(FieldGroupSpec::exact(["hero.title1"])));
        assert_eq!(resolver.default_language(), Language::Sv);
    }

    #[test]
    fn test_visible_fields_and_index() {
        let resolver = Resolver::builtin();
        let fields = json!({
            "hero.title1": {"en": "Welcome"},
            "hero.cta.label": {"en": "Book"},
            "meta.title": {"en": "Home"}
        });
        let fields = fields.as_object().unwrap();

        let all = resolver.visible_fields(fields, None);
        assert_eq!(all.len(), 3);

        let index = resolver.index("home", "hero", fields);
        assert_eq!(index.group("titles").collect::<Vec<_>>(), ["hero.title1"]);
        assert_eq!(index.group("buttons").collect::<Vec<_>>(), ["hero.cta.label"]);
        assert_eq!(index.group("meta").collect::<Vec<_>>(), ["meta.title"]);
    }
}
