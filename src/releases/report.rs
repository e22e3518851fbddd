//! New-release report rendering

use crate::library::BookRecord;
use crate::releases::fanout::ProbeOutcome;
use chrono::{NaiveDate, NaiveDateTime, SubsecRound};
use serde::Serialize;

/// Hour of the release day at which a book counts as released
pub const RELEASE_CUTOFF_HOUR: u32 = 17;

/// Countdown suffix for a release: empty once released, whole days when at
/// least a day away, otherwise the exact `H:MM:SS` remaining.
pub fn relative_label(release: NaiveDate, now: NaiveDateTime) -> String {
    let Some(cutoff) = release.and_hms_opt(RELEASE_CUTOFF_HOUR, 0, 0) else {
        return String::new();
    };
    let now = now.trunc_subsecs(0);
    if cutoff <= now {
        return String::new();
    }

    let remaining = cutoff - now;
    let days = remaining.num_days();
    if days > 0 {
        return format!(": in {} days", days);
    }

    let seconds = remaining.num_seconds();
    format!(
        ": in {}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Non-empty release lists ordered by their earliest release, then series title
pub fn sorted_groups(outcomes: &[ProbeOutcome]) -> Vec<&[BookRecord]> {
    let mut groups: Vec<&[BookRecord]> = outcomes
        .iter()
        .map(ProbeOutcome::releases)
        .filter(|books| !books.is_empty())
        .collect();

    groups.sort_by(|a, b| group_key(a).cmp(&group_key(b)));
    groups
}

fn group_key(books: &[BookRecord]) -> Option<(NaiveDate, &str)> {
    books.iter().map(BookRecord::sort_key).min()
}

/// One text block per series with new releases
pub fn render_releases(outcomes: &[ProbeOutcome], now: NaiveDateTime) -> Vec<String> {
    sorted_groups(outcomes)
        .into_iter()
        .map(|books| {
            let mut block = format!("# {}", books[0].series_title);
            for book in books {
                block.push_str(&format!(
                    "\n  - {}{}",
                    book.title,
                    relative_label(book.release_date, now)
                ));
            }
            block
        })
        .collect()
}

/// One line per series whose check failed, sorted by title
pub fn render_failures(outcomes: &[ProbeOutcome]) -> Vec<String> {
    let mut failed: Vec<(&str, String)> = outcomes
        .iter()
        .filter_map(|o| {
            o.result
                .as_ref()
                .err()
                .map(|e| (o.series_title.as_str(), e.to_string()))
        })
        .collect();
    failed.sort();

    failed
        .into_iter()
        .map(|(series, reason)| format!("! {}: check failed ({})", series, reason))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct SeriesReleases<'a> {
    pub series: &'a str,
    pub books: &'a [BookRecord],
}

#[derive(Debug, Serialize)]
pub struct FailedSeries<'a> {
    pub series: &'a str,
    pub reason: String,
}

/// Machine-readable form of the report
#[derive(Debug, Serialize)]
pub struct ReleaseReport<'a> {
    pub releases: Vec<SeriesReleases<'a>>,
    pub failed: Vec<FailedSeries<'a>>,
}

impl<'a> ReleaseReport<'a> {
    pub fn new(outcomes: &'a [ProbeOutcome]) -> Self {
        let releases = sorted_groups(outcomes)
            .into_iter()
            .map(|books| SeriesReleases {
                series: &books[0].series_title,
                books,
            })
            .collect();

        let mut failed: Vec<FailedSeries<'a>> = outcomes
            .iter()
            .filter_map(|o| {
                o.result.as_ref().err().map(|e| FailedSeries {
                    series: &o.series_title,
                    reason: e.to_string(),
                })
            })
            .collect();
        failed.sort_by(|a, b| a.series.cmp(b.series));

        Self { releases, failed }
    }
}
