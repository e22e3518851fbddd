//! Rank command - order the wishlist by weighted rating

use crate::auth::{restore_session, verify_session, SessionState};
use crate::catalog::{fetch_wishlist, AudibleClient, CatalogClient};
use crate::config::Config;
use crate::error::AuthError;
use crate::wishlist::{format_rating, rank_wishlist, RankedRating};
use anyhow::{Context, Result};

/// Fetch the whole wishlist and rank it
pub async fn ranked_wishlist<C: CatalogClient + ?Sized>(catalog: &C) -> Result<Vec<RankedRating>> {
    let wishlist = fetch_wishlist(catalog)
        .await
        .context("Failed to retrieve wishlist")?;
    Ok(rank_wishlist(wishlist)?)
}

/// Formatted entries, best first, optionally truncated to `limit`
pub fn rank_lines(ranked: &[RankedRating], limit: Option<usize>) -> Vec<String> {
    ranked
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|r| format_rating(&r.record))
        .collect()
}

/// Main entry point for the rank command
pub fn run(marketplace: Option<&str>, limit: Option<usize>) -> Result<()> {
    let config = Config::load()?;
    let marketplace = config.marketplace(marketplace)?;
    let session =
        restore_session(&config.session_path()?, marketplace, chrono::Utc::now()).require()?;
    let client = AudibleClient::new(&session, marketplace, &config.probe.user_agent)?;

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    if rt.block_on(verify_session(session, &client))? == SessionState::Unauthenticated {
        return Err(AuthError::Revoked.into());
    }
    let ranked = rt.block_on(ranked_wishlist(&client))?;

    for line in rank_lines(&ranked, limit) {
        println!("{}", line);
    }

    Ok(())
}
