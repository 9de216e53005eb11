//! A `BTreeMap`-backed [`DocumentStore`] for tests and dry runs.
//!
//! Mirrors the Postgres store's observable behavior: id-ordered keyset
//! pages, set-semantics upserts, and duplicate-tolerant snapshot inserts
//! keyed on `(category, pincode, platform, scraped_at, product_id)`.

use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use pricewatch_core::{Platform, ProductGroup, SnapshotRecord};
use thiserror::Error;
use uuid::Uuid;

use crate::store_api::{DocumentStore, SnapshotInsertOutcome};

#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("simulated write failure")]
    WriteFailed,
}

type SnapshotKey = (String, String, Platform, DateTime<Utc>, String);

#[derive(Debug, Default)]
pub struct MemoryStore {
    groups: Mutex<BTreeMap<Uuid, ProductGroup>>,
    snapshots: Mutex<Vec<SnapshotRecord>>,
    snapshot_keys: Mutex<HashSet<SnapshotKey>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a group directly, bypassing the cache path. For seeding tests.
    pub fn seed_group(&self, group: ProductGroup) {
        self.groups
            .lock()
            .expect("memory store lock poisoned")
            .insert(group.id, group);
    }

    #[must_use]
    pub fn group(&self, id: Uuid) -> Option<ProductGroup> {
        self.groups
            .lock()
            .expect("memory store lock poisoned")
            .get(&id)
            .cloned()
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.lock().expect("memory store lock poisoned").len()
    }

    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.snapshots
            .lock()
            .expect("memory store lock poisoned")
            .len()
    }

    #[must_use]
    pub fn snapshots(&self) -> Vec<SnapshotRecord> {
        self.snapshots
            .lock()
            .expect("memory store lock poisoned")
            .clone()
    }

    /// Make every subsequent write fail until switched back off. Lets tests
    /// exercise the failed-flush retry contract.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), MemoryStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(MemoryStoreError::WriteFailed)
        } else {
            Ok(())
        }
    }
}

impl DocumentStore for MemoryStore {
    type Error = MemoryStoreError;

    async fn fetch_groups_page(
        &self,
        after: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<ProductGroup>, Self::Error> {
        let groups = self.groups.lock().expect("memory store lock poisoned");
        let lower = match after {
            Some(id) => Bound::Excluded(id),
            None => Bound::Unbounded,
        };
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(groups
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(_, g)| g.clone())
            .collect())
    }

    async fn upsert_groups(&self, to_upsert: &[ProductGroup]) -> Result<(), Self::Error> {
        self.check_writable()?;
        let mut groups = self.groups.lock().expect("memory store lock poisoned");
        for group in to_upsert {
            groups.insert(group.id, group.clone());
        }
        Ok(())
    }

    async fn delete_groups(&self, ids: &[Uuid]) -> Result<(), Self::Error> {
        self.check_writable()?;
        let mut groups = self.groups.lock().expect("memory store lock poisoned");
        for id in ids {
            groups.remove(id);
        }
        Ok(())
    }

    async fn insert_snapshots(
        &self,
        records: &[SnapshotRecord],
    ) -> Result<SnapshotInsertOutcome, Self::Error> {
        self.check_writable()?;
        let mut keys = self.snapshot_keys.lock().expect("memory store lock poisoned");
        let mut rows = self.snapshots.lock().expect("memory store lock poisoned");

        let mut outcome = SnapshotInsertOutcome::default();
        for record in records {
            let key = (
                record.category.clone(),
                record.pincode.clone(),
                record.platform,
                record.scraped_at,
                record.product_id.clone(),
            );
            if keys.insert(key) {
                rows.push(record.clone());
                outcome.inserted += 1;
            } else {
                outcome.duplicates += 1;
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use pricewatch_core::GroupMember;

    use super::*;

    fn group(name: &str) -> ProductGroup {
        ProductGroup {
            id: Uuid::new_v4(),
            category: "misc".to_string(),
            primary_name: name.to_string(),
            primary_image: None,
            primary_weight: None,
            brand: None,
            manually_verified: false,
            members: vec![GroupMember::new(Platform::Zepto, "z1")],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn pages_are_ordered_and_disjoint() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.seed_group(group(&format!("g{i}")));
        }

        let first = store.fetch_groups_page(None, 3).await.expect("page 1");
        assert_eq!(first.len(), 3);
        let second = store
            .fetch_groups_page(first.last().map(|g| g.id), 3)
            .await
            .expect("page 2");
        assert_eq!(second.len(), 2);

        let mut ids: Vec<Uuid> = first.iter().chain(&second).map(|g| g.id).collect();
        let before = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), before, "pages must not overlap");
    }

    #[tokio::test]
    async fn duplicate_snapshots_are_counted_not_fatal() {
        let store = MemoryStore::new();
        let record = SnapshotRecord {
            group_id: Uuid::new_v4(),
            category: "dairy".to_string(),
            pincode: "400001".to_string(),
            platform: Platform::Zepto,
            product_id: "z1".to_string(),
            name: "Amul Butter".to_string(),
            weight: None,
            price: None,
            mrp: None,
            discount_percent: None,
            rank: 1,
            in_stock: true,
            rating: None,
            image_url: None,
            product_url: None,
            scraped_at: Utc::now(),
            is_ad: false,
        };

        let first = store
            .insert_snapshots(std::slice::from_ref(&record))
            .await
            .expect("insert");
        assert_eq!(first, SnapshotInsertOutcome { inserted: 1, duplicates: 0 });

        let second = store
            .insert_snapshots(std::slice::from_ref(&record))
            .await
            .expect("insert again");
        assert_eq!(second, SnapshotInsertOutcome { inserted: 0, duplicates: 1 });
        assert_eq!(store.snapshot_count(), 1);
    }
}
