//! Commerce catalog access: owned library and wishlist

pub mod api;

pub use api::AudibleClient;

use crate::library::{OwnedItem, RatingRecord};
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Upper bound on owned items fetched for grouping
pub const LIBRARY_LIMIT: u32 = 1000;

/// Items requested per wishlist page
pub const WISHLIST_PAGE_SIZE: u32 = 50;

/// One page of the wishlist
#[derive(Debug, Clone, Default)]
pub struct WishlistPage {
    pub ratings: Vec<RatingRecord>,
    /// Size of the whole wishlist, not of this page
    pub total_results: u64,
}

#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Owned items, most recently purchased first
    async fn library(&self, num_results: u32) -> Result<Vec<OwnedItem>>;

    /// One page of the wishlist, highest rated first
    async fn wishlist_page(&self, page: u32, page_size: u32) -> Result<WishlistPage>;
}

/// Walk the wishlist page by page until every item has been fetched.
///
/// The total is only known after page 0, so pages are requested one at a time.
pub async fn fetch_wishlist<C: CatalogClient + ?Sized>(client: &C) -> Result<Vec<RatingRecord>> {
    let mut wishlist = Vec::new();
    let mut total: u64 = 1;
    let mut page: u32 = 0;

    while u64::from(page) * u64::from(WISHLIST_PAGE_SIZE) < total {
        let result = client.wishlist_page(page, WISHLIST_PAGE_SIZE).await?;
        if page == 0 {
            total = result.total_results;
        }
        debug!(
            "wishlist page {} returned {} items (total {})",
            page,
            result.ratings.len(),
            total
        );

        if result.ratings.is_empty() {
            break;
        }
        wishlist.extend(result.ratings);
        page += 1;
    }

    Ok(wishlist)
}
