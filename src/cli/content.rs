//! `acms resolve` and `acms show`.

use anyhow::Result;
use owo_colors::OwoColorize;

use super::Target;
use super::common::{Located, block_on, locate, open_store, orchestrator};
use crate::config::DashboardConfig;
use crate::content::{DraftKey, Language, effective_value};
use crate::draft::DraftStore;
use crate::resolve::{FieldGroupSpec, Resolver};

/// One displayed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub field: String,
    pub value: String,
    /// Value comes from a local draft.
    pub drafted: bool,
}

/// Print where a target lives. Needs no store access.
pub fn resolve(config: &DashboardConfig, target: &Target) -> Result<()> {
    let resolver = Resolver::from_config(config);
    let resolved =
        resolver.resolve_subsection(&target.page, &target.section, target.subsection.as_deref());

    let note = if resolved.mapped {
        String::new()
    } else {
        format!(" {}", "(no mapping, fallback)".yellow())
    };
    println!("{}:{} → {}{}", target.page, target.section, resolved.address, note);

    match (&target.subsection, &resolved.group) {
        (Some(sub), Some(spec)) => println!("  {} {}", sub.bold(), describe(spec)),
        (Some(sub), None) => println!("  {} {}", sub.bold(), "no group, whole section".dimmed()),
        _ => {}
    }
    Ok(())
}

fn describe(spec: &FieldGroupSpec) -> String {
    match spec {
        FieldGroupSpec::Exact { fields } => format!("fields {}", fields.join(", ")),
        FieldGroupSpec::Prefix { prefixes } => format!("prefix {}", prefixes.join(" | ")),
    }
}

/// Print effective values of a section, grouped by subsection.
pub fn show(config: &DashboardConfig, target: &Target, lang: Option<Language>) -> Result<()> {
    let resolver = Resolver::from_config(config);
    let lang = lang.unwrap_or(resolver.default_language());
    block_on(show_section(config, &resolver, target, lang))?
}

async fn show_section(
    config: &DashboardConfig,
    resolver: &Resolver,
    target: &Target,
    lang: Language,
) -> Result<()> {
    let sync = orchestrator(config, open_store(config));
    let located = locate(
        &sync,
        resolver,
        &target.page,
        &target.section,
        target.subsection.as_deref(),
    )
    .await?;
    sync.load_drafts(&located.page.id, located.section_key())
        .await?;

    let rows = section_rows(resolver, &located, &sync.drafts().lock(), lang);
    println!("{} [{}]", located.resolved.address.bold(), lang.code());

    if target.subsection.is_some() {
        rows.iter().for_each(print_row);
        return Ok(());
    }

    let fields = located.page.section(located.section_key());
    let index = resolver.index(&target.page, &target.section, &fields);
    let group_names = index.group_names();
    let find = |field: &str| rows.iter().find(|r| r.field == field);
    for name in &group_names {
        println!("{}", format!("── {name} ──").dimmed());
        index.group(name).filter_map(find).for_each(print_row);
    }

    // Ungrouped published fields, then drafts of fields not published yet
    let rest: Vec<&Row> = index
        .ungrouped()
        .filter_map(find)
        .chain(rows.iter().filter(|r| !fields.contains_key(&r.field)))
        .collect();
    if !rest.is_empty() && !group_names.is_empty() {
        println!("{}", "── other ──".dimmed());
    }
    rest.into_iter().for_each(print_row);
    Ok(())
}

fn print_row(row: &Row) {
    let marker = if row.drafted {
        "*".yellow().to_string()
    } else {
        " ".to_string()
    };
    let value = row.value.replace('\n', "\n    ");
    println!("{marker} {}: {value}", row.field.cyan());
}

/// Effective value of every visible field, in section order.
///
/// Drafts of fields that have no published value yet come last.
pub fn section_rows(
    resolver: &Resolver,
    located: &Located,
    drafts: &DraftStore,
    lang: Language,
) -> Vec<Row> {
    let page_id = &located.page.id;
    let section_key = located.section_key();
    let group = located.resolved.group.as_ref();
    let fields = resolver.visible_fields(&located.page.section(section_key), group);

    let mut rows: Vec<Row> = fields
        .iter()
        .map(|(field, data)| {
            let published = resolver.field_text(data, lang);
            let key = DraftKey::new(page_id, section_key, field, lang);
            let draft = drafts.get_draft_value(&key);
            Row {
                field: field.clone(),
                value: effective_value(draft, &published).to_string(),
                drafted: draft.is_some(),
            }
        })
        .collect();

    rows.extend(
        drafts
            .iter()
            .filter(|(key, _)| key.in_section(page_id, section_key) && key.language == lang)
            .filter(|(key, _)| !fields.contains_key(&key.field_key))
            .filter(|(key, _)| group.is_none_or(|spec| spec.matches(&key.field_key)))
            .map(|(key, draft)| Row {
                field: key.field_key.clone(),
                value: draft.value.clone(),
                drafted: true,
            }),
    );
    rows
}
