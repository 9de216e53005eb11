use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Platform, ProductListing};

/// A member reference inside a [`ProductGroup`]: one platform-scoped product
/// id. A given `(platform, product_id)` pair belongs to at most one group
/// across the whole store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupMember {
    pub platform: Platform,
    pub product_id: String,
}

impl GroupMember {
    #[must_use]
    pub fn new(platform: Platform, product_id: impl Into<String>) -> Self {
        Self {
            platform,
            product_id: product_id.into(),
        }
    }
}

/// Durable cross-platform identity for one logical product.
///
/// Created the first time a product is seen with no acceptable match;
/// mutated as later scrapes join or leave; deleted only when membership
/// reaches zero or by explicit admin action. Groups never span categories.
///
/// The `primary_*` fields are a snapshot from the product that created the
/// group. They drive candidate search and display and are not refreshed
/// automatically on later scrapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductGroup {
    pub id: Uuid,
    pub category: String,
    pub primary_name: String,
    pub primary_image: Option<String>,
    pub primary_weight: Option<String>,
    /// Cheap brand proxy (first token of the primary name), when known.
    pub brand: Option<String>,
    /// Set when a human merged or edited the group. Verified groups are
    /// authoritative: automation never re-splits them, though their members
    /// still serve as match candidates.
    pub manually_verified: bool,
    pub members: Vec<GroupMember>,
    pub created_at: DateTime<Utc>,
}

impl ProductGroup {
    /// Denormalized member count persisted for sort/display.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn contains_member(&self, platform: Platform, product_id: &str) -> bool {
        self.members
            .iter()
            .any(|m| m.platform == platform && m.product_id == product_id)
    }

    /// Append a member unless the exact pair is already present.
    ///
    /// Returns `true` if the member was added.
    pub fn add_member(&mut self, member: GroupMember) -> bool {
        if self.contains_member(member.platform, &member.product_id) {
            return false;
        }
        self.members.push(member);
        true
    }

    /// Remove a member pair. Returns `true` if it was present.
    pub fn remove_member(&mut self, platform: Platform, product_id: &str) -> bool {
        let before = self.members.len();
        self.members
            .retain(|m| !(m.platform == platform && m.product_id == product_id));
        self.members.len() != before
    }
}

/// One persisted price/rank observation: a [`ProductListing`] annotated with
/// the grouping outcome and the scrape context.
///
/// The document store enforces uniqueness over
/// `(category, pincode, platform, scraped_at, product_id)`; re-ingesting the
/// same scrape produces counted, non-fatal duplicate rejections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub group_id: Uuid,
    pub category: String,
    pub pincode: String,
    pub platform: Platform,
    pub product_id: String,
    pub name: String,
    pub weight: Option<String>,
    pub price: Option<Decimal>,
    pub mrp: Option<Decimal>,
    pub discount_percent: Option<f64>,
    pub rank: u32,
    pub in_stock: bool,
    pub rating: Option<f64>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub scraped_at: DateTime<Utc>,
    pub is_ad: bool,
}

impl SnapshotRecord {
    /// Build a snapshot row from a listing plus its resolved group and
    /// scrape context. `scraped_at` is the batch timestamp, shared by every
    /// record of one scrape session.
    #[must_use]
    pub fn from_listing(
        listing: &ProductListing,
        group_id: Uuid,
        category: &str,
        pincode: &str,
        scraped_at: DateTime<Utc>,
    ) -> Self {
        Self {
            group_id,
            category: category.to_string(),
            pincode: pincode.to_string(),
            platform: listing.platform,
            product_id: listing.product_id.clone(),
            name: listing.name.clone(),
            weight: listing.weight.clone(),
            price: listing.price,
            mrp: listing.mrp,
            discount_percent: listing.discount_percent,
            rank: listing.rank,
            in_stock: listing.in_stock,
            rating: listing.rating,
            image_url: listing.image_url.clone(),
            product_url: listing.product_url.clone(),
            scraped_at,
            is_ad: listing.is_ad,
        }
    }
}
