//! Domain error types
//!
//! Commands work in `anyhow::Result`; the pipeline stages return these typed
//! errors so callers can tell a fatal library problem from a single series
//! that failed to check.

use thiserror::Error;

/// Owned-library data that violates the catalog contract. Aborts the whole run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("'{title}' has malformed release date '{value}' (expected YYYY-MM-DD)")]
    MalformedReleaseDate { title: String, value: String },

    #[error("'{title}' belongs to series '{series}' but has no release date")]
    MissingReleaseDate { title: String, series: String },
}

/// Failure to check a single series. Never aborts sibling probes.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("series URL '{0}' has no /pd/ segment")]
    InvalidListingUrl(String),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not read listing from {url}: {message}")]
    Body { url: String, message: String },

    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("invalid release date pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankError {
    #[error("Nothing to rank: your wishlist is empty.")]
    EmptyWishlist,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown marketplace '{code}'. Valid marketplaces: {valid}")]
    UnknownMarketplace { code: String, valid: String },

    #[error("No marketplace configured. Run 'seriesctl init' or pass --marketplace")]
    MarketplaceNotSet,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not logged in. Run 'seriesctl login' first")]
    NotLoggedIn,

    #[error("Session expired at {0}. Run 'seriesctl login' again")]
    Expired(chrono::DateTime<chrono::Utc>),

    #[error("Access token was rejected by {host} (status {status})")]
    Rejected { host: String, status: u16 },

    #[error("Stored session is no longer accepted. Run 'seriesctl login' again")]
    Revoked,

    #[error("Login challenge was not answered")]
    ChallengeUnanswered,
}
