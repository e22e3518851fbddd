//! Reduce the owned library to one "latest owned" record per series

use crate::error::IngestError;
use crate::library::models::{BookRecord, OwnedItem, SeriesState};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Date format used by the library endpoint
const OWNED_DATE_FORMAT: &str = "%Y-%m-%d";

/// Series states keyed by title, iterated in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedSeries {
    entries: Vec<SeriesState>,
    index: HashMap<String, usize>,
}

impl OwnedSeries {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, title: &str) -> Option<&SeriesState> {
        self.index.get(title).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeriesState> {
        self.entries.iter()
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.title.as_str())
    }

    /// Drop every series whose title appears in `ignored`
    pub fn retain_unignored(&mut self, ignored: &[String]) {
        if ignored.is_empty() {
            return;
        }
        self.entries.retain(|s| !ignored.iter().any(|i| i == &s.title));
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, s)| (s.title.clone(), i))
            .collect();
    }

    fn observe(&mut self, listing_url: &str, book: BookRecord) {
        match self.index.get(&book.series_title) {
            Some(&i) => {
                let state = &mut self.entries[i];
                if book.release_date > state.latest_owned.release_date {
                    state.latest_owned = book;
                }
            }
            None => {
                self.index
                    .insert(book.series_title.clone(), self.entries.len());
                self.entries.push(SeriesState {
                    title: book.series_title.clone(),
                    listing_url: listing_url.to_string(),
                    latest_owned: book,
                });
            }
        }
    }
}

impl<'a> IntoIterator for &'a OwnedSeries {
    type Item = &'a SeriesState;
    type IntoIter = std::slice::Iter<'a, SeriesState>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Group owned items by their primary series, keeping the newest release of each.
///
/// Items outside any series are ignored. A single unparseable release date
/// fails the whole pass.
pub fn group_owned_series(items: &[OwnedItem]) -> Result<OwnedSeries, IngestError> {
    let mut owned = OwnedSeries::default();

    for item in items {
        let Some(series) = item.primary_series() else {
            continue;
        };

        let raw_date =
            item.release_date
                .as_deref()
                .ok_or_else(|| IngestError::MissingReleaseDate {
                    title: item.title.clone(),
                    series: series.title.clone(),
                })?;

        let release_date = NaiveDate::parse_from_str(raw_date.trim(), OWNED_DATE_FORMAT)
            .map_err(|_| IngestError::MalformedReleaseDate {
                title: item.title.clone(),
                value: raw_date.to_string(),
            })?;

        let book = BookRecord {
            asin: item.asin.clone(),
            title: item.title.clone(),
            series_title: series.title.clone(),
            release_date,
            cover_url: None,
        };

        owned.observe(&series.url, book);
    }

    Ok(owned)
}
