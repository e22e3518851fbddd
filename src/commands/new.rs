//! New command - check every owned series for unowned releases

use crate::auth::{restore_session, verify_session, SessionState};
use crate::catalog::{AudibleClient, CatalogClient, LIBRARY_LIMIT};
use crate::config::Config;
use crate::error::AuthError;
use crate::library::group_owned_series;
use crate::marketplace::Marketplace;
use crate::releases::{
    probe_all, render_failures, render_releases, FanOut, HttpListingSource, ListingParser,
    ReleaseProber, ReleaseReport,
};
use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{debug, info};

/// Fetch the owned library, group it by series and probe every series listing
pub async fn check_new_releases<C: CatalogClient + ?Sized>(
    catalog: &C,
    config: &Config,
    marketplace: Marketplace,
    show_progress: bool,
) -> Result<FanOut> {
    let items = catalog
        .library(LIBRARY_LIMIT)
        .await
        .context("Failed to retrieve library")?;

    let mut owned = group_owned_series(&items)?;
    for title in owned.titles().filter(|t| config.is_ignored(t)) {
        debug!("ignoring series {}", title);
    }
    owned.retain_unignored(&config.ignore.series);
    info!("{} owned items in {} series", items.len(), owned.len());

    let source = HttpListingSource::new(&config.probe).context("Failed to build HTTP client")?;
    let parser = ListingParser::new(config.probe.listing_date_format.clone())?;
    let prober = ReleaseProber::new(source, parser, marketplace.domain);

    let fan_out = probe_all(&prober, &owned, config.probe.max_concurrent, |p| {
        if show_progress {
            let status = if p.failed { " (failed)" } else { "" };
            eprintln!("[{}/{}] {}{}", p.completed, p.total, p.series_title, status);
        }
    })
    .await;

    Ok(fan_out)
}

/// Release blocks followed by failed series, ready for display
pub fn report_lines(fan_out: &FanOut) -> Vec<String> {
    let now = chrono::Local::now().naive_local();
    let mut lines = render_releases(&fan_out.outcomes, now);

    let failures = render_failures(&fan_out.outcomes);
    if !failures.is_empty() {
        lines.push(failures.join("\n"));
    }

    if lines.is_empty() {
        lines.push(format!(
            "No new releases in {} series.",
            fan_out.summary.total
        ));
    }
    lines
}

/// Main entry point for the new command
pub fn run(marketplace: Option<&str>, json: bool, quiet: bool) -> Result<()> {
    let config = Config::load()?;
    let marketplace = config.marketplace(marketplace)?;
    let session =
        restore_session(&config.session_path()?, marketplace, chrono::Utc::now()).require()?;
    let client = AudibleClient::new(&session, marketplace, &config.probe.user_agent)?;

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    if rt.block_on(verify_session(session, &client))? == SessionState::Unauthenticated {
        return Err(AuthError::Revoked.into());
    }
    let fan_out = rt.block_on(check_new_releases(
        &client,
        &config,
        marketplace,
        !quiet && !json,
    ))?;

    if json {
        let report = ReleaseReport::new(&fan_out.outcomes);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for block in report_lines(&fan_out) {
        if block.starts_with('!') {
            println!("{}", block.red());
        } else {
            println!("{}", block);
        }
        println!();
    }

    if !quiet {
        let summary = fan_out.summary;
        println!(
            "Checked {} series: {} with new releases, {} failed",
            summary.total.to_string().bold(),
            summary.with_releases,
            summary.failed
        );
    }

    Ok(())
}
