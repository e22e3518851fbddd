use crate::config::Config;
use crate::marketplace::MARKETPLACES;
use anyhow::Result;
use colored::Colorize;

pub fn run() -> Result<()> {
    let config = Config::load().unwrap_or_default();
    let current = config.user.marketplace.as_deref().map(str::to_lowercase);

    for marketplace in MARKETPLACES {
        if current.as_deref() == Some(marketplace.code) {
            println!("{} {}", marketplace.to_string().green(), "(configured)".dimmed());
        } else {
            println!("{}", marketplace);
        }
    }

    Ok(())
}
