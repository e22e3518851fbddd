//! Wishlist ranking by rating weighted with log-scaled review counts
//!
//! A raw average is noisy for books with a handful of reviews, so each
//! rating is multiplied by a popularity weight in 0..=5:
//! `5 * ln(1 + reviews) / max(ln(1 + reviews))`.

use crate::error::RankError;
use crate::library::RatingRecord;

/// Weight of the most reviewed item
const MAX_POPULARITY: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedRating {
    pub record: RatingRecord,
    /// Normalized popularity in 0..=5
    pub popularity: f64,
    pub score: f64,
}

fn log_popularity(record: &RatingRecord) -> f64 {
    (record.review_count as f64).ln_1p()
}

/// Order the wishlist by `average_rating * popularity`, highest first.
///
/// Equal scores keep their input order.
pub fn rank_wishlist(records: Vec<RatingRecord>) -> Result<Vec<RankedRating>, RankError> {
    let max_log = records
        .iter()
        .map(log_popularity)
        .reduce(f64::max)
        .ok_or(RankError::EmptyWishlist)?;

    let mut ranked: Vec<RankedRating> = records
        .into_iter()
        .map(|record| {
            // Nobody has reviews: no popularity signal at all
            let popularity = if max_log > 0.0 {
                MAX_POPULARITY * (log_popularity(&record) / max_log)
            } else {
                0.0
            };
            RankedRating {
                score: record.average_rating * popularity,
                popularity,
                record,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(ranked)
}

/// Multi-line summary of one rating
pub fn format_rating(record: &RatingRecord) -> String {
    let mut lines = vec![
        record.title.clone(),
        format!("  - average rating: {}", record.average_rating),
    ];

    if let Some(histogram) = &record.star_histogram {
        let stars: Vec<String> = histogram
            .iter()
            .enumerate()
            .rev()
            .map(|(i, count)| format!("{}★ {}", i + 1, count))
            .collect();
        lines.push(format!("  - stars: {}", stars.join(" / ")));
    }

    lines.push(format!("  - reviews: {}", record.review_count));
    lines.join("\n")
}
