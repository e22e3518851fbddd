//! Audible JSON API client for the owned library and wishlist

use crate::auth::Session;
use crate::catalog::{CatalogClient, WishlistPage};
use crate::error::AuthError;
use crate::library::{OwnedItem, RatingRecord};
use crate::marketplace::Marketplace;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

const LIBRARY_RESPONSE_GROUPS: &str = "series,product_desc,product_attrs";
const WISHLIST_RESPONSE_GROUPS: &str = "product_desc,rating";

// ============================================================================
// API Response Structs
// ============================================================================

#[derive(Debug, Deserialize)]
struct LibraryResponse {
    #[serde(default)]
    items: Vec<OwnedItem>,
}

#[derive(Debug, Deserialize)]
struct WishlistResponse {
    #[serde(default)]
    products: Vec<WishlistProduct>,
    #[serde(default)]
    total_results: u64,
}

#[derive(Debug, Deserialize)]
struct WishlistProduct {
    title: String,
    rating: Option<ProductRating>,
}

#[derive(Debug, Deserialize)]
struct ProductRating {
    #[serde(default)]
    num_reviews: u64,
    overall_distribution: Option<RatingDistribution>,
}

#[derive(Debug, Deserialize)]
struct RatingDistribution {
    #[serde(default)]
    average_rating: f64,
    one_star: Option<u64>,
    two_star: Option<u64>,
    three_star: Option<u64>,
    four_star: Option<u64>,
    five_star: Option<u64>,
}

impl RatingDistribution {
    /// Star counts 1★ → 5★, only when every bucket is present
    fn histogram(&self) -> Option<Vec<u64>> {
        Some(vec![
            self.one_star?,
            self.two_star?,
            self.three_star?,
            self.four_star?,
            self.five_star?,
        ])
    }
}

fn product_to_rating(product: WishlistProduct) -> RatingRecord {
    let (average, reviews, histogram) = match product.rating {
        Some(rating) => {
            let distribution = rating.overall_distribution;
            (
                distribution.as_ref().map_or(0.0, |d| d.average_rating),
                rating.num_reviews,
                distribution.as_ref().and_then(RatingDistribution::histogram),
            )
        }
        None => (0.0, 0, None),
    };

    RatingRecord::new(product.title, average, reviews, histogram)
}

// ============================================================================
// Client
// ============================================================================

/// Authenticated client for one marketplace's API host
pub struct AudibleClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl AudibleClient {
    pub fn new(session: &Session, marketplace: Marketplace, user_agent: &str) -> Result<Self> {
        Self::with_token(&session.access_token, marketplace, user_agent)
    }

    pub fn with_token(access_token: &str, marketplace: Marketplace, user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: format!("https://{}/1.0", marketplace.api_host()),
            access_token: access_token.to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path_and_query);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(AuthError::Rejected {
                host: self.base_url.clone(),
                status: status.as_u16(),
            }
            .into());
        }
        if !status.is_success() {
            anyhow::bail!("Audible API returned status {} for {}", status, url);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }

    /// Cheapest authenticated call, used to check a token is accepted
    pub async fn verify(&self) -> Result<()> {
        self.library(1).await.map(|_| ())
    }
}

#[async_trait]
impl CatalogClient for AudibleClient {
    async fn library(&self, num_results: u32) -> Result<Vec<OwnedItem>> {
        info!("retrieving library");
        let response: LibraryResponse = self
            .get_json(&format!(
                "library?num_results={}&response_groups={}&sort_by={}",
                num_results,
                urlencoding::encode(LIBRARY_RESPONSE_GROUPS),
                urlencoding::encode("-PurchaseDate"),
            ))
            .await?;
        Ok(response.items)
    }

    async fn wishlist_page(&self, page: u32, page_size: u32) -> Result<WishlistPage> {
        info!("retrieving wishlist page {}", page);
        let response: WishlistResponse = self
            .get_json(&format!(
                "wishlist?num_results={}&page={}&response_groups={}&sort_by={}",
                page_size,
                page,
                urlencoding::encode(WISHLIST_RESPONSE_GROUPS),
                urlencoding::encode("-Rating"),
            ))
            .await?;

        Ok(WishlistPage {
            ratings: response.products.into_iter().map(product_to_rating).collect(),
            total_results: response.total_results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_response_parses() {
        let json = r#"{
            "items": [
                {"asin": "B01", "title": "One", "series": [{"title": "S", "url": "/pd/S/B0S"}], "release_date": "2020-02-02"},
                {"asin": "B02", "title": "Two", "series": null, "release_date": "2021-02-02"}
            ],
            "response_groups": ["series"]
        }"#;
        let response: LibraryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 2);
        assert_eq!(response.items[0].primary_series().unwrap().title, "S");
    }

    #[test]
    fn test_wishlist_product_with_full_distribution() {
        let json = r#"{
            "products": [{
                "asin": "B03",
                "title": "Project Hail Mary",
                "rating": {
                    "num_reviews": 1200,
                    "overall_distribution": {
                        "average_rating": 4.8,
                        "display_stars": 5.0,
                        "num_ratings": 5000,
                        "one_star": 10, "two_star": 20, "three_star": 70,
                        "four_star": 400, "five_star": 4500
                    }
                }
            }],
            "total_results": 1
        }"#;
        let response: WishlistResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.total_results, 1);

        let rating = product_to_rating(response.products.into_iter().next().unwrap());
        assert_eq!(rating.title, "Project Hail Mary");
        assert_eq!(rating.average_rating, 4.8);
        assert_eq!(rating.review_count, 1200);
        assert_eq!(rating.star_histogram, Some(vec![10, 20, 70, 400, 4500]));
    }

    #[test]
    fn test_wishlist_product_without_rating() {
        let json = r#"{"title": "Preorder", "rating": null}"#;
        let product: WishlistProduct = serde_json::from_str(json).unwrap();
        let rating = product_to_rating(product);
        assert_eq!(rating.average_rating, 0.0);
        assert_eq!(rating.review_count, 0);
        assert!(rating.star_histogram.is_none());
    }

    #[test]
    fn test_partial_distribution_has_no_histogram() {
        let json = r#"{"title": "Odd", "rating": {"num_reviews": 3, "overall_distribution": {"average_rating": 3.5, "five_star": 2}}}"#;
        let product: WishlistProduct = serde_json::from_str(json).unwrap();
        let rating = product_to_rating(product);
        assert_eq!(rating.review_count, 3);
        assert!(rating.star_histogram.is_none());
    }

    #[test]
    fn test_base_url_uses_api_host() {
        let client = AudibleClient::with_token(
            "token",
            Marketplace::from_code("uk").unwrap(),
            "seriesctl-test",
        )
        .unwrap();
        assert_eq!(client.base_url, "https://api.audible.co.uk/1.0");
    }
}
