//! `acms watch`: an editing session with autosync.
//!
//! Edits are read from stdin, one per line:
//!
//! ```text
//! about hero hero.title en Our story
//! about hero hero.subtitle - First line\nSecond line
//! :flush
//! :publish page-about
//! :quit
//! ```
//!
//! `-` stands for the default language and `\n` for a line break. Drafts
//! are saved once input has been quiet for the debounce delay.
//!
//! ```text
//! stdin thread --WatchLine--> editor --SyncMsg--> SyncRunner
//!                                                     │
//!                               status line <──watch──┘
//! ```

use std::io::BufRead;

use anyhow::{Result, bail};
use tokio::sync::{mpsc, watch};

use super::common::{Store, block_on, open_store, orchestrator};
use super::drafts::load_journal;
use super::shutdown::register_runner;
use crate::config::{DashboardConfig, cfg};
use crate::content::Language;
use crate::draft::DraftUpdate;
use crate::logger::SyncStatusLine;
use crate::resolve::Resolver;
use crate::store::{ContentStore, StoreError};
use crate::sync::{SyncMsg, SyncOrchestrator, SyncRunner, SyncState};
use crate::{debug, log};

const LINE_CAPACITY: usize = 64;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchLine {
    Edit(EditLine),
    Flush,
    Publish(String),
    Quit,
}

/// `page section field lang value`, addressed by dashboard slugs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditLine {
    pub page: String,
    pub section: String,
    pub field: String,
    pub lang: Language,
    pub value: String,
}

pub fn watch(config: &DashboardConfig) -> Result<()> {
    let resolver = Resolver::from_config(config);
    let sync = orchestrator(config, open_store(config));
    let lookup = open_store(config);
    block_on(run_session(sync, resolver, lookup, spawn_stdin_bridge()))?
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str, default_lang: Language) -> Result<Option<WatchLine>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    if let Some(command) = line.strip_prefix(':') {
        let (name, rest) = next_word(command);
        return match (name, rest) {
            ("flush", "") => Ok(Some(WatchLine::Flush)),
            ("quit" | "q", "") => Ok(Some(WatchLine::Quit)),
            ("publish", page_id) if !page_id.is_empty() && !page_id.contains(' ') => {
                Ok(Some(WatchLine::Publish(page_id.to_string())))
            }
            ("publish", _) => Err("usage: :publish <page-id>".into()),
            _ => Err(format!("unknown command `:{name}`")),
        };
    }

    let (page, rest) = next_word(line);
    let (section, rest) = next_word(rest);
    let (field, rest) = next_word(rest);
    let (lang, value) = next_word(rest);
    if lang.is_empty() {
        return Err("expected `page section field lang value`".into());
    }

    let lang = match lang {
        "-" => default_lang,
        code => code.parse()?,
    };
    Ok(Some(WatchLine::Edit(EditLine {
        page: page.to_string(),
        section: section.to_string(),
        field: field.to_string(),
        lang,
        value: value.replace("\\n", "\n"),
    })))
}

/// Split off the first whitespace-separated word.
fn next_word(s: &str) -> (&str, &str) {
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (s, ""),
    }
}

/// Read stdin on its own thread; the runtime never blocks on it.
fn spawn_stdin_bridge() -> mpsc::Receiver<WatchLine> {
    let (tx, rx) = mpsc::channel(LINE_CAPACITY);
    std::thread::spawn(move || {
        let default_lang = cfg().content.default_language;
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log!("watch"; "failed to read stdin: {}", e);
                    break;
                }
            };
            match parse_line(&line, default_lang) {
                Ok(Some(parsed)) => {
                    let quit = parsed == WatchLine::Quit;
                    if tx.blocking_send(parsed).is_err() || quit {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => log!("watch"; "{}", e),
            }
        }
    });
    rx
}

async fn run_session(
    sync: SyncOrchestrator<Store>,
    resolver: Resolver,
    lookup: Store,
    lines: mpsc::Receiver<WatchLine>,
) -> Result<()> {
    let resumed = load_journal(&sync, None).await?;

    let (runner, tx) = SyncRunner::new(sync);
    let states = runner.subscribe();
    register_runner(tx.clone());

    if resumed > 0 {
        log!("watch"; "resuming {} staged drafts", resumed);
        // Fresh channel, cannot be full
        tx.try_send(SyncMsg::Flush).ok();
    }
    log!("watch"; "reading edits from stdin, `:quit` to stop");

    let (state, (), ()) = tokio::join!(
        runner.run(),
        drive_edits(lines, tx, &resolver, &lookup),
        show_status(states),
    );

    if state.pending > 0 {
        bail!(
            "session ended with {} unsaved changes: {}",
            state.pending,
            state.last_error.unwrap_or_default()
        );
    }
    log!("watch"; "all changes saved");
    Ok(())
}

/// Turn input lines into runner messages until input ends or the runner
/// stops.
async fn drive_edits<S: ContentStore>(
    mut lines: mpsc::Receiver<WatchLine>,
    tx: mpsc::Sender<SyncMsg>,
    resolver: &Resolver,
    lookup: &S,
) {
    loop {
        let line = tokio::select! {
            line = lines.recv() => line,
            () = tx.closed() => return,
        };

        let msg = match line {
            None | Some(WatchLine::Quit) => SyncMsg::Shutdown,
            Some(WatchLine::Flush) => SyncMsg::Flush,
            Some(WatchLine::Publish(page_id)) => SyncMsg::Publish { page_id },
            Some(WatchLine::Edit(edit)) => match to_update(resolver, lookup, &edit).await {
                Ok(update) => SyncMsg::Edit(update),
                Err(e) => {
                    log!("watch"; "{}:{}: {}", edit.page, edit.section, e);
                    continue;
                }
            },
        };

        let stop = matches!(msg, SyncMsg::Shutdown);
        if tx.send(msg).await.is_err() || stop {
            return;
        }
    }
}

/// Resolve an edit line against the published page it targets.
///
/// The page is fetched per edit: the published value moves on every flush.
async fn to_update<S: ContentStore>(
    resolver: &Resolver,
    lookup: &S,
    edit: &EditLine,
) -> Result<DraftUpdate, StoreError> {
    let resolved = resolver.resolve_subsection(&edit.page, &edit.section, None);
    if !resolved.mapped {
        debug!("watch"; "no mapping for {}:{}, using {}", edit.page, edit.section, resolved.address);
    }
    let address = resolved.address;
    let page = lookup.fetch_published_content(&address.page_key).await?;

    let update = DraftUpdate::new(
        &page.id,
        &address.section_key,
        &edit.field,
        edit.lang,
        &edit.value,
    );
    Ok(match page.text(&address.section_key, &edit.field, edit.lang) {
        Some(published) => update.with_published(published),
        None => update,
    })
}

async fn show_status(mut states: watch::Receiver<SyncState>) {
    let mut line = SyncStatusLine::new();
    while states.changed().await.is_ok() {
        let state = states.borrow_and_update().clone();
        line.render(&state);
    }
}
