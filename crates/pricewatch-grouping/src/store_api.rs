//! The document-store contract the grouping core is written against.
//!
//! Implementations: `pricewatch-db`'s Postgres-backed `PgStore` in
//! production, [`crate::MemoryStore`] for tests and dry runs. The storage
//! engine itself is out of scope here; only this contract is used.

use pricewatch_core::{ProductGroup, SnapshotRecord};
use uuid::Uuid;

/// Outcome of one insert-many call over snapshot rows.
///
/// Rows rejected by the uniqueness constraint over
/// `(category, pincode, platform, scraped_at, product_id)` are counted, not
/// fatal — re-running a batch must not abort it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotInsertOutcome {
    pub inserted: usize,
    pub duplicates: usize,
}

impl SnapshotInsertOutcome {
    pub fn absorb(&mut self, other: SnapshotInsertOutcome) {
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
    }
}

/// Async storage contract for product groups and price snapshots.
pub trait DocumentStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Keyset-paged read of all groups, ordered by id: returns up to `limit`
    /// groups with ids strictly greater than `after` (or from the start when
    /// `after` is `None`). An empty page signals the end of the cursor.
    fn fetch_groups_page(
        &self,
        after: Option<Uuid>,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<Vec<ProductGroup>, Self::Error>> + Send;

    /// Upsert-by-id with set semantics on members, member count, primary
    /// display fields, brand, and the verified flag.
    fn upsert_groups(
        &self,
        groups: &[ProductGroup],
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;

    /// Delete groups by id; ids that no longer exist are ignored.
    fn delete_groups(
        &self,
        ids: &[Uuid],
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;

    /// Unordered insert-many of snapshot rows, tolerating duplicate
    /// rejections on the uniqueness constraint.
    fn insert_snapshots(
        &self,
        records: &[SnapshotRecord],
    ) -> impl std::future::Future<Output = Result<SnapshotInsertOutcome, Self::Error>> + Send;
}
