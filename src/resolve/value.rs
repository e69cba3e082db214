//! Rendering a stored field value as editor text.

use serde_json::Value;

use crate::content::Language;

/// Sub-fields used as the heading of a list item, in preference order.
const TITLE_KEYS: &[&str] = &["title", "name", "label"];
/// Sub-fields used as the body of a list item, in preference order.
const BODY_KEYS: &[&str] = &["description", "text", "content"];

/// Pick the value for `language` from a `language → value` object.
///
/// Falls back to `default_language`, then to an empty string. An object
/// without any language key is an unlocalized value and rendered whole.
pub fn resolve_value(field_data: &Value, language: Language, default_language: Language) -> String {
    let Value::Object(per_language) = field_data else {
        // Unlocalized field: render whatever is stored
        return render(field_data);
    };
    let localized = Language::ALL
        .iter()
        .any(|lang| per_language.contains_key(lang.code()));
    if !localized && !per_language.is_empty() {
        // Unlocalized structured value, not a language map
        return render(field_data);
    }

    [language, default_language]
        .iter()
        .find_map(|lang| per_language.get(lang.code()).filter(|v| !v.is_null()))
        .map(render)
        .unwrap_or_default()
}

/// Render a single stored value as text.
pub fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => render_list(items),
        Value::Object(_) => serde_json::to_string_pretty(value).unwrap_or_default(),
    }
}

/// One numbered line per record: `"1. <title>: <description>"`.
fn render_list(items: &[Value]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, render_item(item)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_item(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Object(record) => {
            let pick = |keys: &[&str]| {
                keys.iter()
                    .find_map(|k| record.get(*k).and_then(Value::as_str))
                    .filter(|s| !s.is_empty())
            };
            match (pick(TITLE_KEYS), pick(BODY_KEYS)) {
                (Some(title), Some(body)) => format!("{title}: {body}"),
                (Some(part), None) | (None, Some(part)) => part.to_string(),
                (None, None) => item.to_string(),
            }
        }
        other => other.to_string(),
    }
}
