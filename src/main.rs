//! Arctic CMS - headless content dashboard core.

mod cli;
mod config;
mod content;
mod draft;
mod logger;
mod resolve;
mod store;
mod sync;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::drafts::EditRequest;
use cli::{Cli, Commands};
use config::{DashboardConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    cli::shutdown::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = init_config(DashboardConfig::load(&cli)?);

    match &cli.command {
        Commands::Init { dry } => cli::init::new_project(&config, *dry),
        Commands::Resolve { target } => cli::content::resolve(&config, target),
        Commands::Show { target, lang } => cli::content::show(&config, target, *lang),
        Commands::Edit {
            page,
            section,
            field,
            lang,
            value,
            sync,
        } => {
            let request = EditRequest {
                page,
                section,
                field,
                lang: *lang,
                value,
                sync: *sync,
            };
            cli::drafts::edit(&config, &request)
        }
        Commands::Sync { page } => cli::drafts::sync(&config, page.as_deref()),
        Commands::Publish { page } => cli::drafts::publish(&config, page),
        Commands::Status => cli::drafts::status(&config),
        Commands::Watch => cli::watch::watch(&config),
    }
}
