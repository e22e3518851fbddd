//! Login and logout commands

use crate::auth::{clear_session, run_login_flow, TerminalPrompter, TokenLogin};
use crate::commands::init::choose_marketplace;
use crate::config::Config;
use crate::error::ConfigError;
use anyhow::{Context, Result};
use colored::Colorize;
use std::io;

/// Run the login flow and store the resulting session
pub fn run(marketplace: Option<&str>) -> Result<()> {
    let mut config = Config::load()?;

    let marketplace = match config.marketplace(marketplace) {
        Ok(marketplace) => marketplace,
        Err(ConfigError::MarketplaceNotSet) => {
            let stdin = io::stdin();
            let chosen = choose_marketplace(&mut stdin.lock(), &mut io::stdout())?;
            config.user.marketplace = Some(chosen.code.to_string());
            config.save()?;
            chosen
        }
        Err(e) => return Err(e.into()),
    };

    println!("Logging in to {}...", marketplace.domain.cyan());

    let backend = TokenLogin::new(marketplace, config.probe.user_agent.clone());
    let stdin = io::stdin();
    let mut prompter = TerminalPrompter::new(stdin.lock(), io::stdout());

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let session = rt.block_on(run_login_flow(&backend, &mut prompter))?;

    let path = config.session_path()?;
    session.save(&path)?;
    println!("{} Session saved to {}", "✓".green(), path.display());

    Ok(())
}

pub fn logout() -> Result<()> {
    let config = Config::load()?;
    let path = config.session_path()?;

    if clear_session(&path)? {
        println!("Removed session {}", path.display());
    } else {
        println!("No stored session.");
    }

    Ok(())
}
