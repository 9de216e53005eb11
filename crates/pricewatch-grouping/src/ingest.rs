//! Batch ingestion: resolve a group for every scraped record, queue
//! snapshot rows, and flush in bulk.
//!
//! One scrape session supplies a single timestamp for every record so
//! later "snapshot at time T" queries see a consistent batch. The ingestor
//! never generates per-record timestamps.

use chrono::{DateTime, Utc};
use pricewatch_core::{MatchConfig, ScrapedItem, SnapshotRecord};

use crate::error::GroupingError;
use crate::resolver::resolve_group_id;
use crate::store::GroupingStore;
use crate::store_api::{DocumentStore, SnapshotInsertOutcome};

/// Records processed between progress log lines.
const PROGRESS_INTERVAL: usize = 1000;

/// Accounting for one ingest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub processed: usize,
    pub inserted: usize,
    /// Snapshot rows rejected by the uniqueness constraint (e.g. a re-run
    /// batch). Counted, never fatal.
    pub duplicates: usize,
    pub groups_created: usize,
    pub groups_flushed: usize,
}

/// Ingest one batch of already-platform-normalized scrape records.
///
/// The cache must be loaded first and must not be mutated concurrently —
/// single-writer discipline is the caller's responsibility. Group
/// assignments made early in the batch are visible to later records of the
/// same batch.
///
/// # Errors
///
/// Returns [`GroupingError::Store`] if a snapshot insert or the final dirty
/// flush fails. On flush failure the dirty set is left intact so the caller
/// can retry.
pub async fn ingest_batch<S: DocumentStore>(
    store: &S,
    cache: &mut GroupingStore,
    items: &[ScrapedItem],
    pincode: &str,
    scraped_at: DateTime<Utc>,
    config: &MatchConfig,
    chunk_size: usize,
) -> Result<IngestSummary, GroupingError> {
    let mut summary = IngestSummary {
        processed: items.len(),
        ..IngestSummary::default()
    };

    let mut rows: Vec<SnapshotRecord> = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let assignment = resolve_group_id(cache, &item.listing, &item.category, config);
        if assignment.created {
            summary.groups_created += 1;
        }
        rows.push(SnapshotRecord::from_listing(
            &item.listing,
            assignment.group_id,
            &item.category,
            pincode,
            scraped_at,
        ));

        if (i + 1) % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                processed = i + 1,
                total = items.len(),
                groups_created = summary.groups_created,
                "ingest progress"
            );
        }
    }

    let chunk_size = chunk_size.max(1);
    let mut outcome = SnapshotInsertOutcome::default();
    for chunk in rows.chunks(chunk_size) {
        let chunk_outcome = store
            .insert_snapshots(chunk)
            .await
            .map_err(GroupingError::store)?;
        outcome.absorb(chunk_outcome);
    }
    summary.inserted = outcome.inserted;
    summary.duplicates = outcome.duplicates;
    if outcome.duplicates > 0 {
        tracing::warn!(
            duplicates = outcome.duplicates,
            "snapshot rows rejected as duplicates"
        );
    }

    let flush = cache.save_dirty_groups(store, chunk_size).await?;
    summary.groups_flushed = flush.upserted;

    tracing::info!(
        processed = summary.processed,
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        groups_created = summary.groups_created,
        groups_flushed = summary.groups_flushed,
        "ingest batch complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use pricewatch_core::{Platform, ProductListing};
    use rust_decimal::Decimal;

    use super::*;
    use crate::memory::MemoryStore;

    fn item(platform: Platform, id: &str, name: &str, weight: Option<&str>) -> ScrapedItem {
        ScrapedItem {
            category: "instant-food".to_string(),
            listing: ProductListing {
                platform,
                product_id: id.to_string(),
                name: name.to_string(),
                weight: weight.map(str::to_string),
                price: Some(Decimal::new(1400, 2)),
                mrp: None,
                discount_percent: None,
                rank: 1,
                in_stock: true,
                rating: None,
                image_url: None,
                product_url: None,
                scraped_at: Utc::now(),
                is_ad: false,
            },
        }
    }

    #[tokio::test]
    async fn batch_resolves_groups_and_persists_snapshots() {
        let store = MemoryStore::new();
        let mut cache = GroupingStore::new();
        cache.load(&store).await.expect("load");

        let batch_ts = Utc::now();
        let items = vec![
            item(
                Platform::Zepto,
                "1",
                "Maggi 2 Minute Masala Noodles 70g",
                Some("70g"),
            ),
            item(
                Platform::Blinkit,
                "9",
                "Maggi 2 Minute Masala Noodles Single 70g",
                Some("70 g"),
            ),
            item(Platform::Dmart, "d3", "Tata Salt Iodised 1kg", Some("1kg")),
        ];

        let summary = ingest_batch(
            &store,
            &mut cache,
            &items,
            "400001",
            batch_ts,
            &MatchConfig::default(),
            500,
        )
        .await
        .expect("ingest");

        assert_eq!(summary.processed, 3);
        assert_eq!(summary.inserted, 3);
        assert_eq!(summary.duplicates, 0);
        // The two Maggi listings share one group.
        assert_eq!(summary.groups_created, 2);
        assert_eq!(summary.groups_flushed, 2);
        assert_eq!(store.group_count(), 2);
        assert_eq!(store.snapshot_count(), 3);
        assert_eq!(cache.dirty_count(), 0, "flush ran exactly once at the end");

        // Every snapshot row carries the batch context.
        for row in store.snapshots() {
            assert_eq!(row.pincode, "400001");
            assert_eq!(row.scraped_at, batch_ts);
        }
    }

    #[tokio::test]
    async fn within_batch_assignments_are_visible_to_later_records() {
        let store = MemoryStore::new();
        let mut cache = GroupingStore::new();
        cache.load(&store).await.expect("load");

        // The same platform product appearing twice in one batch must hit
        // the exact-identity short-circuit the second time.
        let items = vec![
            item(Platform::Zepto, "1", "Amul Butter 500g", Some("500g")),
            item(Platform::Zepto, "1", "Amul Butter 500g", Some("500g")),
        ];
        let summary = ingest_batch(
            &store,
            &mut cache,
            &items,
            "400001",
            Utc::now(),
            &MatchConfig::default(),
            500,
        )
        .await
        .expect("ingest");

        assert_eq!(summary.groups_created, 1);
        // Same (category, pincode, platform, scraped_at, product_id): the
        // second row is a counted duplicate.
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.duplicates, 1);
    }

    #[tokio::test]
    async fn rerunning_a_batch_is_idempotent() {
        let store = MemoryStore::new();
        let mut cache = GroupingStore::new();
        cache.load(&store).await.expect("load");

        let batch_ts = Utc::now();
        let items = vec![item(
            Platform::Zepto,
            "1",
            "Maggi 2 Minute Masala Noodles 70g",
            Some("70g"),
        )];

        let first = ingest_batch(
            &store,
            &mut cache,
            &items,
            "400001",
            batch_ts,
            &MatchConfig::default(),
            500,
        )
        .await
        .expect("first run");
        let second = ingest_batch(
            &store,
            &mut cache,
            &items,
            "400001",
            batch_ts,
            &MatchConfig::default(),
            500,
        )
        .await
        .expect("second run");

        assert_eq!(first.groups_created, 1);
        assert_eq!(second.groups_created, 0);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 1);
        assert_eq!(store.group_count(), 1);
        let group = store.snapshots()[0].group_id;
        assert!(store.group(group).is_some());
    }

    #[tokio::test]
    async fn chunked_inserts_cover_the_whole_batch() {
        let store = MemoryStore::new();
        let mut cache = GroupingStore::new();
        cache.load(&store).await.expect("load");

        let items: Vec<ScrapedItem> = (0..7)
            .map(|i| {
                item(
                    Platform::Blinkit,
                    &format!("b{i}"),
                    &format!("Product Variant Number {i}"),
                    None,
                )
            })
            .collect();

        // Chunk size smaller than the batch exercises the chunking path.
        let summary = ingest_batch(
            &store,
            &mut cache,
            &items,
            "560001",
            Utc::now(),
            &MatchConfig::default(),
            3,
        )
        .await
        .expect("ingest");

        assert_eq!(summary.inserted, 7);
        assert_eq!(store.snapshot_count(), 7);
    }
}
