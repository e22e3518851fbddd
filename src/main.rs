mod auth;
mod catalog;
mod cli;
mod commands;
mod config;
mod error;
mod library;
mod marketplace;
mod releases;
mod wishlist;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "seriesctl=info" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::New { marketplace, json } => {
            commands::new::run(marketplace.as_deref(), json, cli.quiet)?;
        }
        Commands::Rank { marketplace, limit } => {
            commands::rank::run(marketplace.as_deref(), limit)?;
        }
        Commands::Markets => {
            commands::markets::run()?;
        }
        Commands::Init { force } => {
            commands::init::run(force)?;
        }
        Commands::Login { marketplace } => {
            commands::login::run(marketplace.as_deref())?;
        }
        Commands::Logout => {
            commands::login::logout()?;
        }
        Commands::Repl => {
            commands::repl::run()?;
        }
    }

    Ok(())
}
