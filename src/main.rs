//! teimap - Layered identifier maps for TEI document projects.

mod address;
mod archive;
mod broadcast;
mod cli;
mod config;
mod layer;
mod logger;
mod manager;
mod resource;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{ProjectConfig, init_config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    init_config(ProjectConfig::load(&cli)?);
    let config = config::cfg();
    debug!("config"; "{} mode, archive at {}", config.project.mode, config.archive_dir().display());

    match &cli.command {
        Commands::Show { layer } => cli::show::show(&config, *layer),
        Commands::Resolve { target, reference } => cli::show::resolve(&config, target, *reference),
        Commands::Check => cli::show::check(&config),
        command => match cli::edit::request_for(command)? {
            Some(request) => cli::edit::run(&config, request),
            None => Ok(()),
        },
    }
}
