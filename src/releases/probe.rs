//! Release probe for a single series listing page

use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::library::{BookRecord, SeriesState};
use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Path segment of catalog product URLs replaced by the public series page
const PRODUCT_PATH_SEGMENT: &str = "/pd/";

const RELEASE_LABEL_SELECTOR: &str = ".releaseDateLabel";
const TITLE_SELECTOR: &str = ".bc-heading a.bc-link";
const COVER_SELECTOR: &str = "picture img";
const RELEASE_DATE_PATTERN: &str = r"\d+-\d+-\d+";

/// Build the public series listing URL on `domain` from a catalog series URL
pub fn listing_url(series_url: &str, domain: &str) -> Result<String, ProbeError> {
    if !series_url.contains(PRODUCT_PATH_SEGMENT) {
        return Err(ProbeError::InvalidListingUrl(series_url.to_string()));
    }
    Ok(series_url.replacen(
        PRODUCT_PATH_SEGMENT,
        &format!("https://{}/series/", domain),
        1,
    ))
}

/// Fetches listing pages
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Body of the page at `url`, whatever its HTTP status
    async fn fetch(&self, url: &str) -> Result<String, ProbeError>;
}

/// `ListingSource` backed by a shared reqwest client
pub struct HttpListingSource {
    client: reqwest::Client,
}

impl HttpListingSource {
    pub fn new(config: &ProbeConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ListingSource for HttpListingSource {
    async fn fetch(&self, url: &str) -> Result<String, ProbeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ProbeError::Http {
                url: url.to_string(),
                source,
            })?;

        // Error pages are parsed like any other page; they just yield no releases
        info!("fetched {} ({})", url, response.status());

        response.text().await.map_err(|e| ProbeError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Extracts release candidates from a series listing page
pub struct ListingParser {
    release_label: Selector,
    title: Selector,
    cover: Selector,
    date_pattern: Regex,
    date_format: String,
}

impl ListingParser {
    /// `date_format` is the chrono format of the dates on the page, e.g. `%d-%m-%Y`
    pub fn new(date_format: impl Into<String>) -> Result<Self, ProbeError> {
        Ok(Self {
            release_label: parse_selector(RELEASE_LABEL_SELECTOR)?,
            title: parse_selector(TITLE_SELECTOR)?,
            cover: parse_selector(COVER_SELECTOR)?,
            date_pattern: Regex::new(RELEASE_DATE_PATTERN)?,
            date_format: date_format.into(),
        })
    }

    /// Every release found on the page, in document order.
    ///
    /// A label without a usable date, list item or title is skipped and
    /// the rest of the page is still read.
    pub fn parse(&self, html: &str, series_title: &str) -> Vec<BookRecord> {
        let document = Html::parse_document(html);
        document
            .select(&self.release_label)
            .filter_map(|label| self.parse_release(label, series_title))
            .collect()
    }

    fn parse_release(&self, label: ElementRef<'_>, series_title: &str) -> Option<BookRecord> {
        let text = label.text().collect::<String>();

        let Some(found) = self.date_pattern.find(&text) else {
            warn!("{}: no release date in label {:?}", series_title, text.trim());
            return None;
        };
        let release_date = match NaiveDate::parse_from_str(found.as_str(), &self.date_format) {
            Ok(date) => date,
            Err(e) => {
                warn!(
                    "{}: could not parse release date {:?}: {}",
                    series_title,
                    found.as_str(),
                    e
                );
                return None;
            }
        };

        let Some(item) = label
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "li")
        else {
            warn!("{}: release label outside a list item", series_title);
            return None;
        };

        let Some(link) = item.select(&self.title).next() else {
            warn!("{}: release on {} has no title", series_title, release_date);
            return None;
        };
        let title = link.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            warn!("{}: release on {} has an empty title", series_title, release_date);
            return None;
        }

        let cover_url = item
            .select(&self.cover)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(String::from);

        Some(BookRecord {
            asin: link.value().attr("href").and_then(asin_from_href),
            title,
            series_title: series_title.to_string(),
            release_date,
            cover_url,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ProbeError> {
    Selector::parse(selector).map_err(|e| ProbeError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// ASIN from a product link such as `/pd/Title-Audiobook/B0CXYZ1234?ref=...`
fn asin_from_href(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next()?;
    let candidate = path.trim_end_matches('/').rsplit('/').next()?;
    let valid = candidate.len() == 10
        && candidate
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    valid.then(|| candidate.to_string())
}

/// Keep only books released strictly after `latest_owned`
pub fn newer_than(candidates: Vec<BookRecord>, latest_owned: NaiveDate) -> Vec<BookRecord> {
    candidates
        .into_iter()
        .filter(|book| book.release_date > latest_owned)
        .collect()
}

/// Checks series listings on one marketplace for unowned releases
pub struct ReleaseProber<S> {
    source: S,
    parser: ListingParser,
    domain: String,
}

impl<S: ListingSource> ReleaseProber<S> {
    pub fn new(source: S, parser: ListingParser, domain: impl Into<String>) -> Self {
        Self {
            source,
            parser,
            domain: domain.into(),
        }
    }

    /// Releases newer than the latest owned book, in listing order
    pub async fn probe(&self, series: &SeriesState) -> Result<Vec<BookRecord>, ProbeError> {
        let url = listing_url(&series.listing_url, &self.domain)?;
        let body = self.source.fetch(&url).await?;

        let candidates = self.parser.parse(&body, &series.title);
        debug!(
            "{}: {} releases listed, latest owned {}",
            series.title,
            candidates.len(),
            series.latest_owned.release_date
        );

        Ok(newer_than(candidates, series.latest_owned.release_date))
    }
}
