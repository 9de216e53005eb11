use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Platform;

/// One product listing as scraped from one platform at one moment.
///
/// Immutable once scraped; a later scrape of the same platform/category/
/// pincode supersedes it rather than editing it. `product_id` is scoped to
/// the platform and is not globally unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListing {
    pub platform: Platform,
    pub product_id: String,
    pub name: String,
    /// Raw weight/quantity string as shown on the storefront, e.g. `"1 Ltr"`.
    pub weight: Option<String>,
    /// Current selling price.
    pub price: Option<Decimal>,
    /// Pre-discount price (MRP).
    pub mrp: Option<Decimal>,
    pub discount_percent: Option<f64>,
    /// 1-based position in the scraped result page; ties broken by scrape order.
    pub rank: u32,
    pub in_stock: bool,
    pub rating: Option<f64>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub scraped_at: DateTime<Utc>,
    /// `true` when the listing was a sponsored/advertised slot.
    pub is_ad: bool,
}

/// An ingest-batch input record: one listing plus the category it was
/// scraped under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedItem {
    pub category: String,
    pub listing: ProductListing,
}

/// One logical product assembled from listings across platforms for a single
/// scrape moment.
///
/// Display-time only; never persisted. Within one merge run every input
/// listing is attached to exactly one `MergedProduct`, and each platform key
/// appears at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedProduct {
    pub display_name: String,
    pub image_url: Option<String>,
    pub weight: Option<String>,
    pub rating: Option<f64>,
    pub listings: BTreeMap<Platform, ProductListing>,
}

impl MergedProduct {
    /// Seed a merged product from a single listing.
    #[must_use]
    pub fn seeded_from(listing: ProductListing) -> Self {
        let mut listings = BTreeMap::new();
        let display_name = listing.name.clone();
        let image_url = listing.image_url.clone();
        let weight = listing.weight.clone();
        let rating = listing.rating;
        listings.insert(listing.platform, listing);
        Self {
            display_name,
            image_url,
            weight,
            rating,
            listings,
        }
    }

    /// Number of platforms with a listing attached.
    #[must_use]
    pub fn platform_count(&self) -> usize {
        self.listings.len()
    }

    /// The listing matched for `platform`, if any.
    #[must_use]
    pub fn listing(&self, platform: Platform) -> Option<&ProductListing> {
        self.listings.get(&platform)
    }

    /// Attach a matched listing, backfilling image/weight/rating the seed
    /// lacked.
    pub fn attach(&mut self, listing: ProductListing) {
        if self.image_url.is_none() {
            self.image_url = listing.image_url.clone();
        }
        if self.weight.is_none() {
            self.weight = listing.weight.clone();
        }
        if self.rating.is_none() {
            self.rating = listing.rating;
        }
        self.listings.insert(listing.platform, listing);
    }
}
