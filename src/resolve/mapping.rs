//! Static `"page:section"` → backend address table.

use rustc_hash::FxHashMap;

use crate::content::ContentAddress;

/// Address used when a page/section pair has no mapping.
pub const FALLBACK_PAGE: &str = "hero";
pub const FALLBACK_SECTION: &str = "hero";

/// Built-in mappings: `(page_slug, section_slug, page_key, section_key)`.
///
/// Dashboard slugs follow the site navigation. Backend keys follow the
/// seeded content rows, which predate some renames.
const BUILTIN: &[(&str, &str, &str, &str)] = &[
    ("home", "hero", "home", "hero"),
    ("home", "intro", "home", "intro"),
    ("home", "highlights", "home", "features"),
    ("home", "testimonials", "home", "testimonials"),
    ("home", "cta", "home", "cta"),
    ("about", "hero", "about", "hero"),
    ("about", "story", "about", "story"),
    ("about", "team", "about", "team"),
    ("about", "values", "about", "values"),
    ("experiences", "hero", "experiences", "hero"),
    ("experiences", "packages", "experiences", "packages"),
    ("experiences", "faq", "experiences", "faq"),
    ("northern-lights", "hero", "aurora", "hero"),
    ("northern-lights", "tours", "aurora", "tours"),
    ("accommodation", "hero", "accommodation", "hero"),
    ("accommodation", "rooms", "accommodation", "rooms"),
    ("gallery", "hero", "gallery", "hero"),
    ("contact", "hero", "contact", "hero"),
    ("contact", "info", "contact", "info"),
    ("contact", "form", "contact", "form"),
    ("footer", "main", "global", "footer"),
    ("navigation", "main", "global", "nav"),
];

/// Lookup key for a slug pair. Slugs are matched trimmed and lowercase.
pub fn mapping_key(page_slug: &str, section_slug: &str) -> String {
    format!(
        "{}:{}",
        page_slug.trim().to_lowercase(),
        section_slug.trim().to_lowercase()
    )
}

/// Immutable mapping table, built once at startup.
#[derive(Debug, Clone)]
pub struct MappingTable {
    entries: FxHashMap<String, ContentAddress>,
}

impl MappingTable {
    /// Built-in table with `overrides` applied on top.
    ///
    /// Override keys use the same `"page:section"` form.
    pub fn with_overrides<'a>(
        overrides: impl IntoIterator<Item = (&'a str, ContentAddress)>,
    ) -> Self {
        let mut entries: FxHashMap<_, _> = BUILTIN
            .iter()
            .map(|(page, section, key, sect)| {
                (mapping_key(page, section), ContentAddress::new(*key, *sect))
            })
            .collect();

        for (key, address) in overrides {
            let normalized = match key.split_once(':') {
                Some((page, section)) => mapping_key(page, section),
                None => key.trim().to_lowercase(),
            };
            entries.insert(normalized, address);
        }

        Self { entries }
    }

    pub fn builtin() -> Self {
        Self::with_overrides(std::iter::empty())
    }

    /// Mapped address, if the pair is known.
    pub fn lookup(&self, page_slug: &str, section_slug: &str) -> Option<&ContentAddress> {
        self.entries.get(&mapping_key(page_slug, section_slug))
    }

    /// Mapped address, or the `hero/hero` fallback. Never fails.
    pub fn resolve(&self, page_slug: &str, section_slug: &str) -> ContentAddress {
        match self.lookup(page_slug, section_slug) {
            Some(address) => address.clone(),
            None => {
                crate::debug!("resolve"; "no mapping for {}:{}, using fallback {}/{}",
                    page_slug, section_slug, FALLBACK_PAGE, FALLBACK_SECTION);
                fallback_address()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

pub fn fallback_address() -> ContentAddress {
    ContentAddress::new(FALLBACK_PAGE, FALLBACK_SECTION)
}
