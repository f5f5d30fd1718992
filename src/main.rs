//! svgtint - inspect and recolor SVG icons.

mod cli;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use svgtint::{config::Config, debug, logger};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.input().verbose);

    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load config `{}`", cli.config.display()))?;
    if let Some(path) = &config.config_path {
        debug!("config"; "using {}", path.display());
    }

    match &cli.command {
        Commands::Inspect { args } => cli::inspect::run(args, &config),
        Commands::Apply { args } => cli::apply::run(args),
        Commands::Preview { args } => cli::preview::run(args, &config),
    }
}
