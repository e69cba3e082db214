//! `[content]`, `[mapping]` and `[groups]` configuration.
//!
//! # Example
//!
//! ```toml
//! [content]
//! default_language = "en"     # Fallback when a value is missing in the requested language
//!
//! [mapping]                   # "page:section" = "page_key/section_key"
//! "about:team" = "about/team"
//!
//! [groups]                    # "page:section:subsection" = group spec
//! "home:hero:titles" = { prefix = "hero.title|hero.subtitle" }
//! "home:hero:meta" = { fields = ["meta.title", "meta.description"] }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::content::{ContentAddress, Language};
use crate::resolve::FieldGroupSpec;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub default_language: Language,
}

/// Validate `[mapping]` entries.
pub fn validate_mapping(mapping: &BTreeMap<String, String>, diag: &mut ConfigDiagnostics) {
    for (key, value) in mapping {
        let field = format!("mapping.\"{key}\"");
        if split_key(key, 2).is_none() {
            diag.error_with_hint(
                &field,
                format!("`{key}` is not a page:section key"),
                "keys look like \"about:team\"",
            );
        }
        if ContentAddress::parse(value).is_none() {
            diag.error_with_hint(
                &field,
                format!("`{value}` is not a content address"),
                "values look like \"page_key/section_key\"",
            );
        }
    }
}

/// Validate `[groups]` entries.
pub fn validate_groups(groups: &BTreeMap<String, FieldGroupSpec>, diag: &mut ConfigDiagnostics) {
    for (key, spec) in groups {
        let field = format!("groups.\"{key}\"");
        if split_key(key, 3).is_none() {
            diag.error_with_hint(
                &field,
                format!("`{key}` is not a page:section:subsection key"),
                "keys look like \"home:hero:titles\"",
            );
        }
        if spec.is_empty() {
            diag.error(&field, "group matches no fields");
        }
    }
}

/// Split a colon-joined key into exactly `parts` non-empty parts.
fn split_key(key: &str, parts: usize) -> Option<Vec<&str>> {
    let split: Vec<_> = key.split(':').map(str::trim).collect();
    (split.len() == parts && split.iter().all(|p| !p.is_empty())).then_some(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_default_language() {
        assert_eq!(test_parse_config("").content.default_language, Language::En);

        let config = test_parse_config("[content]\ndefault_language = \"sv\"");
        assert_eq!(config.content.default_language, Language::Sv);
    }

    #[test]
    fn test_unknown_language_rejected() {
        let result = toml::from_str::<crate::config::DashboardConfig>(
            "[content]\ndefault_language = \"xx\"",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_groups_parse_both_forms() {
        let config = test_parse_config(
            r#"
[groups]
"home:hero:titles" = { prefix = "hero.title|hero.subtitle" }
"home:hero:meta" = { fields = ["meta.title"] }
"#,
        );
        assert_eq!(
            config.groups["home:hero:titles"],
            FieldGroupSpec::prefix("hero.title|hero.subtitle")
        );
        assert_eq!(
            config.groups["home:hero:meta"],
            FieldGroupSpec::exact(["meta.title"])
        );
    }

    #[test]
    fn test_mapping_validation() {
        let config = test_parse_config(
            r#"
[mapping]
"about:team" = "about/team"
"broken" = "about/team"
"about:bad" = "no-slash"
"#,
        );
        let mut diag = ConfigDiagnostics::new();
        validate_mapping(&config.mapping, &mut diag);

        let fields: Vec<_> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["mapping.\"about:bad\"", "mapping.\"broken\""]);
    }

    #[test]
    fn test_group_validation() {
        let config = test_parse_config(
            r#"
[groups]
"home:hero:empty" = { fields = [] }
"home:hero" = { prefix = "hero." }
"#,
        );
        let mut diag = ConfigDiagnostics::new();
        validate_groups(&config.groups, &mut diag);

        let fields: Vec<_> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["groups.\"home:hero\"", "groups.\"home:hero:empty\""]);
    }
}
