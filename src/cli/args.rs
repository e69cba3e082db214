//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CONFIG_FILE;
use crate::content::Language;

/// Arctic content dashboard: drafts, autosync and content keys
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: acms.toml)
    #[arg(short = 'C', long, global = true, default_value = CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create acms.toml and a content store with starter pages
    #[command(visible_alias = "i")]
    Init {
        /// Print the config template instead of writing files
        #[arg(long)]
        dry: bool,
    },

    /// Show where a page/section is stored
    #[command(visible_alias = "r")]
    Resolve {
        #[command(flatten)]
        target: Target,
    },

    /// Show the effective values of a section (draft, else published)
    Show {
        #[command(flatten)]
        target: Target,

        /// Language to display
        #[arg(short, long)]
        lang: Option<Language>,
    },

    /// Stage an edit as a draft
    #[command(visible_alias = "e")]
    Edit {
        /// Dashboard page name
        page: String,
        /// Dashboard section name
        section: String,
        /// Field key, e.g. `hero.title`
        field: String,
        /// Language code (sv, en, de, fr)
        lang: Language,
        /// New value
        value: String,

        /// Save to published content right away
        #[arg(short, long)]
        sync: bool,
    },

    /// Save staged drafts to published content
    #[command(visible_alias = "s")]
    Sync {
        /// Only this page id (see `acms status`)
        page: Option<String>,
    },

    /// Promote a page's drafts to published content
    #[command(visible_alias = "p")]
    Publish {
        /// Page id, e.g. `page-about` (see `acms status`)
        page: String,
    },

    /// List staged drafts
    Status,

    /// Autosync edits read from stdin (`page section field lang value`)
    #[command(visible_alias = "w")]
    Watch,
}

/// Dashboard page, section and optional subsection.
#[derive(clap::Args, Debug, Clone)]
pub struct Target {
    /// Dashboard page name, e.g. `northern-lights`
    pub page: String,
    /// Dashboard section name, e.g. `tours`
    pub section: String,
    /// Subsection whose field group filters the output
    pub subsection: Option<String>,
}

impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init { .. })
    }
}
