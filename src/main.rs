mod cli;
mod commands;
mod config;
mod paths;
mod provider;
mod ui;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
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
    };

    let registry = provider::registry()?;

    match cli.command {
        Command::Eval(args) => commands::eval::run(&ctx, args),
        Command::Show(args) => commands::workflow::show(&ctx, &registry, &args),
        Command::Diff(args) => commands::workflow::diff(&ctx, &registry, &args),
        Command::Apply(args) => commands::workflow::apply(&ctx, &registry, &args),
        Command::Providers => commands::providers::run(&ctx, &registry),
    }
}
