//! Quire - serve a directory of Markdown and HTML pages as a personal wiki.

mod cli;
mod config;
mod core;
mod lock;
mod logger;
mod page;
mod pipeline;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::WikiConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = WikiConfig::load(&cli).context("invalid configuration")?;
    cli::serve::serve(Arc::new(config))
}
