//! Records shared by the release pipeline and the wishlist ranker

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single book, either owned or announced on a series listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asin: Option<String>,
    pub title: String,
    pub series_title: String,
    pub release_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl BookRecord {
    /// Key used wherever books are ordered: release date, then series title
    pub fn sort_key(&self) -> (NaiveDate, &str) {
        (self.release_date, self.series_title.as_str())
    }
}

/// Per-series tracking state built from the owned library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesState {
    pub title: String,
    /// Catalog-relative product URL, e.g. `/pd/Some-Series-Audiobook/B0...`
    pub listing_url: String,
    pub latest_owned: BookRecord,
}

/// Wishlist entry with its review statistics
#[derive(Debug, Clone, PartialEq)]
pub struct RatingRecord {
    pub title: String,
    /// Average star rating, clamped to 0.0..=5.0
    pub average_rating: f64,
    pub review_count: u64,
    /// Star counts ordered 1★ → 5★
    pub star_histogram: Option<Vec<u64>>,
}

impl RatingRecord {
    pub fn new(
        title: impl Into<String>,
        average_rating: f64,
        review_count: u64,
        star_histogram: Option<Vec<u64>>,
    ) -> Self {
        let average_rating = if average_rating.is_finite() {
            average_rating.clamp(0.0, 5.0)
        } else {
            0.0
        };

        Self {
            title: title.into(),
            average_rating,
            review_count,
            star_histogram,
        }
    }
}

/// Series membership as returned by the library endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeriesMembership {
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// One item of the owned library
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OwnedItem {
    pub asin: Option<String>,
    pub title: String,
    /// `null` in the API response for books outside any series
    #[serde(default)]
    pub series: Option<Vec<SeriesMembership>>,
    pub release_date: Option<String>,
}

impl OwnedItem {
    /// The series this item counts towards, if any
    pub fn primary_series(&self) -> Option<&SeriesMembership> {
        self.series.as_deref().and_then(|s| s.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_is_clamped() {
        assert_eq!(RatingRecord::new("a", 7.5, 1, None).average_rating, 5.0);
        assert_eq!(RatingRecord::new("b", -1.0, 1, None).average_rating, 0.0);
        assert_eq!(RatingRecord::new("c", f64::NAN, 1, None).average_rating, 0.0);
        assert_eq!(RatingRecord::new("d", 4.2, 1, None).average_rating, 4.2);
    }

    #[test]
    fn test_owned_item_from_api_json() {
        let json = r#"{
            "asin": "B0TEST0001",
            "title": "Leviathan Wakes",
            "series": [
                {"asin": "B0SERIES01", "title": "The Expanse", "sequence": "1", "url": "/pd/The-Expanse-Audiobooks/B0SERIES01"},
                {"asin": "B0SERIES02", "title": "Expanse Omnibus", "url": "/pd/Omnibus/B0SERIES02"}
            ],
            "release_date": "2011-06-15"
        }"#;

        let item: OwnedItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.primary_series().unwrap().title, "The Expanse");
        assert_eq!(item.release_date.as_deref(), Some("2011-06-15"));
    }

    #[test]
    fn test_owned_item_null_series() {
        let json = r#"{"asin": null, "title": "Standalone", "series": null, "release_date": "2020-01-01"}"#;
        let item: OwnedItem = serde_json::from_str(json).unwrap();
        assert!(item.primary_series().is_none());
    }

    #[test]
    fn test_sort_key_orders_by_date_then_series() {
        let book = |series: &str, date: &str| BookRecord {
            asin: None,
            title: "t".to_string(),
            series_title: series.to_string(),
            release_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            cover_url: None,
        };

        let a = book("Zeta", "2024-01-01");
        let b = book("Alpha", "2024-01-01");
        let c = book("Alpha", "2024-02-01");
        assert!(b.sort_key() < a.sort_key());
        assert!(a.sort_key() < c.sort_key());
    }
}
