//! Concurrent release probes across every tracked series

use crate::error::ProbeError;
use crate::library::{BookRecord, OwnedSeries};
use crate::releases::probe::{ListingSource, ReleaseProber};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

/// Result of probing one series
#[derive(Debug)]
pub struct ProbeOutcome {
    pub series_title: String,
    pub result: Result<Vec<BookRecord>, ProbeError>,
}

impl ProbeOutcome {
    /// New releases, or an empty slice for failed probes
    pub fn releases(&self) -> &[BookRecord] {
        match &self.result {
            Ok(books) => books,
            Err(_) => &[],
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanOutSummary {
    pub total: usize,
    /// Probes that completed, with or without releases
    pub checked: usize,
    pub with_releases: usize,
    pub failed: usize,
}

/// Emitted once per finished probe, in completion order
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub completed: usize,
    pub total: usize,
    pub series_title: &'a str,
    pub failed: bool,
}

#[derive(Debug, Default)]
pub struct FanOut {
    /// In completion order
    pub outcomes: Vec<ProbeOutcome>,
    pub summary: FanOutSummary,
}

/// Probe every series concurrently and wait for all of them.
///
/// `max_concurrent` caps in-flight requests; `None` starts every probe at
/// once. A failed probe never cancels the others.
pub async fn probe_all<S, F>(
    prober: &ReleaseProber<S>,
    owned: &OwnedSeries,
    max_concurrent: Option<usize>,
    mut on_progress: F,
) -> FanOut
where
    S: ListingSource,
    F: FnMut(Progress<'_>),
{
    let total = owned.len();
    let limit = max_concurrent.unwrap_or(total).max(1);

    let mut fan_out = FanOut {
        outcomes: Vec::with_capacity(total),
        summary: FanOutSummary {
            total,
            ..FanOutSummary::default()
        },
    };

    let mut probes = stream::iter(owned.iter())
        .map(|series| async move { (series, prober.probe(series).await) })
        .buffer_unordered(limit);

    while let Some((series, result)) = probes.next().await {
        match &result {
            Ok(books) => {
                fan_out.summary.checked += 1;
                if !books.is_empty() {
                    fan_out.summary.with_releases += 1;
                }
                info!("{}: {} new releases", series.title, books.len());
            }
            Err(error) => {
                fan_out.summary.failed += 1;
                warn!("{}: check failed: {}", series.title, error);
            }
        }

        on_progress(Progress {
            completed: fan_out.outcomes.len() + 1,
            total,
            series_title: &series.title,
            failed: result.is_err(),
        });

        fan_out.outcomes.push(ProbeOutcome {
            series_title: series.title.clone(),
            result,
        });
    }

    fan_out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::models::SeriesMembership;
    use crate::library::{group_owned_series, OwnedItem};
    use crate::releases::probe::tests::{date, listing_item, listing_page};
    use crate::releases::probe::ListingParser;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// In-memory listing pages; unknown URLs fail like a dead host
    struct StaticListings {
        pages: HashMap<String, String>,
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl StaticListings {
        fn new(pages: Vec<(String, String)>) -> Self {
            Self {
                pages: pages.into_iter().collect(),
                in_flight: Arc::new(AtomicUsize::new(0)),
                peak: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl ListingSource for StaticListings {
        async fn fetch(&self, url: &str) -> Result<String, ProbeError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.pages.get(url).cloned().ok_or_else(|| ProbeError::Body {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })
        }
    }

    fn owned(title: &str, series: &str, released: &str) -> OwnedItem {
        OwnedItem {
            asin: None,
            title: title.to_string(),
            series: Some(vec![SeriesMembership {
                title: series.to_string(),
                url: format!("/pd/{}/B0{}", series, series.to_uppercase()),
            }]),
            release_date: Some(released.to_string()),
        }
    }

    fn url(series: &str) -> String {
        format!("https://audible.com.au/series/{}/B0{}", series, series.to_uppercase())
    }

    fn prober(source: StaticListings) -> ReleaseProber<StaticListings> {
        ReleaseProber::new(source, ListingParser::new("%d-%m-%Y").unwrap(), "audible.com.au")
    }

    #[tokio::test]
    async fn test_end_to_end_excludes_owned_release() {
        let library = group_owned_series(&[
            owned("Foo 1", "Foo", "2023-01-01"),
            owned("Foo 2", "Foo", "2023-06-01"),
        ])
        .unwrap();

        let source = StaticListings::new(vec![(
            url("Foo"),
            listing_page(&[
                listing_item("Foo 2", "B0FOO00002", "01-06-2023"),
                listing_item("Foo 3", "B0FOO00003", "01-01-2024"),
            ]),
        )]);
        let prober = prober(source);

        let fan_out = probe_all(&prober, &library, None, |_| {}).await;
        assert_eq!(fan_out.outcomes.len(), 1);

        let releases = fan_out.outcomes[0].result.as_ref().unwrap();
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].title, "Foo 3");
        assert_eq!(releases[0].release_date, date("2024-01-01"));
    }

    #[tokio::test]
    async fn test_failure_is_isolated_and_counted() {
        let library = group_owned_series(&[
            owned("a1", "Alpha", "2020-01-01"),
            owned("b1", "Beta", "2020-01-01"),
            owned("g1", "Gamma", "2020-01-01"),
        ])
        .unwrap();

        // Beta has no page and fails
        let source = StaticListings::new(vec![
            (url("Alpha"), listing_page(&[listing_item("a2", "B0ALPHA002", "01-01-2030")])),
            (url("Gamma"), listing_page(&[listing_item("g0", "B0GAMMA000", "01-01-2019")])),
        ]);
        let prober = prober(source);

        let mut seen = Vec::new();
        let fan_out = probe_all(&prober, &library, None, |p| {
            seen.push((p.completed, p.total, p.series_title.to_string(), p.failed));
        })
        .await;

        assert_eq!(
            fan_out.summary,
            FanOutSummary {
                total: 3,
                checked: 2,
                with_releases: 1,
                failed: 1,
            }
        );

        let beta = fan_out
            .outcomes
            .iter()
            .find(|o| o.series_title == "Beta")
            .unwrap();
        assert!(beta.result.is_err());
        assert!(beta.releases().is_empty());

        // One progress event per probe, counting up
        assert_eq!(seen.len(), 3);
        assert_eq!(
            seen.iter().map(|s| s.0).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(seen.iter().all(|s| s.1 == 3));
        assert!(seen.iter().any(|s| s.2 == "Beta" && s.3));
    }

    #[tokio::test]
    async fn test_concurrency_cap_is_respected() {
        let items: Vec<OwnedItem> = (0..8)
            .map(|i| owned("x", &format!("s{}", i), "2020-01-01"))
            .collect();
        let library = group_owned_series(&items).unwrap();

        let pages = (0..8)
            .map(|i| (url(&format!("s{}", i)), listing_page(&[])))
            .collect();
        let source = StaticListings::new(pages);
        let peak = Arc::clone(&source.peak);
        let prober = prober(source);

        let fan_out = probe_all(&prober, &library, Some(2), |_| {}).await;
        assert_eq!(fan_out.summary.checked, 8);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_empty_library_completes_immediately() {
        let prober = prober(StaticListings::new(Vec::new()));
        let fan_out = probe_all(&prober, &OwnedSeries::default(), None, |_| {}).await;
        assert!(fan_out.outcomes.is_empty());
        assert_eq!(fan_out.summary, FanOutSummary::default());
    }
}
