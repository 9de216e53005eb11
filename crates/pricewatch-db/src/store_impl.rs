//! [`DocumentStore`] implementation backed by Postgres.

use pricewatch_core::{ProductGroup, SnapshotRecord};
use pricewatch_grouping::{DocumentStore, SnapshotInsertOutcome};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{groups, snapshots, DbError};

/// The production document store: a thin wrapper over a [`PgPool`]
/// delegating to the table-level functions in this crate.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DocumentStore for PgStore {
    type Error = DbError;

    async fn fetch_groups_page(
        &self,
        after: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<ProductGroup>, Self::Error> {
        groups::fetch_groups_page(&self.pool, after, limit).await
    }

    async fn upsert_groups(&self, to_upsert: &[ProductGroup]) -> Result<(), Self::Error> {
        for group in to_upsert {
            groups::upsert_group(&self.pool, group).await?;
        }
        Ok(())
    }

    async fn delete_groups(&self, ids: &[Uuid]) -> Result<(), Self::Error> {
        groups::delete_groups(&self.pool, ids).await
    }

    async fn insert_snapshots(
        &self,
        records: &[SnapshotRecord],
    ) -> Result<SnapshotInsertOutcome, Self::Error> {
        snapshots::insert_snapshots(&self.pool, records).await
    }
}
