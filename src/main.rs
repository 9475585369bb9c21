mod catalog;
mod cli;
mod commands;
mod config;
mod control;
mod engine;
mod family;
mod store;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Explicit config file, if given
    pub config: Option<PathBuf>,
    /// API key from `--api-key` / `UNRAID_API_KEY`
    pub api_key: Option<String>,
    /// Categories from `--categories`
    pub categories: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
        api_key: cli.api_key,
        categories: cli.categories,
    };

    match cli.command {
        Command::Run => commands::run::run(&ctx),
        Command::Once => commands::once::run(&ctx),
        Command::Query => commands::query::run(&ctx),
        Command::Categories => commands::categories::run(&ctx),
        Command::Status { prefix } => commands::status::run(&ctx, prefix.as_deref()),
        Command::Control { target, action, id } => {
            commands::control::run(&ctx, target, action, &id)
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "unraid-mirror", &mut io::stdout());
            Ok(())
        }
    }
}
