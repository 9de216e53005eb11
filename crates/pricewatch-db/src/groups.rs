//! Database operations for the `product_groups` table.

use chrono::{DateTime, Utc};
use pricewatch_core::{GroupMember, ProductGroup};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `product_groups` table. `members` is a jsonb array of
/// `{platform, product_id}` pairs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GroupRow {
    pub id: Uuid,
    pub category: String,
    pub primary_name: String,
    pub primary_image: Option<String>,
    pub primary_weight: Option<String>,
    pub brand: Option<String>,
    pub manually_verified: bool,
    pub members: serde_json::Value,
    pub member_count: i32,
    pub created_at: DateTime<Utc>,
}

impl GroupRow {
    /// Decode the row into the domain type.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::MemberEncoding`] if the jsonb member list does not
    /// decode — that would indicate an out-of-band write, not normal
    /// operation.
    pub fn into_group(self) -> Result<ProductGroup, DbError> {
        let members: Vec<GroupMember> = serde_json::from_value(self.members)?;
        Ok(ProductGroup {
            id: self.id,
            category: self.category,
            primary_name: self.primary_name,
            primary_image: self.primary_image,
            primary_weight: self.primary_weight,
            brand: self.brand,
            manually_verified: self.manually_verified,
            members,
            created_at: self.created_at,
        })
    }
}

const GROUP_COLUMNS: &str = "id, category, primary_name, primary_image, primary_weight, brand, \
     manually_verified, members, member_count, created_at";

/// Keyset-paged read over all groups, ordered by id.
///
/// Returns up to `limit` groups with ids strictly greater than `after`
/// (from the start when `after` is `None`). An empty result means the
/// cursor is exhausted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure or [`DbError::MemberEncoding`]
/// on a corrupt member list.
pub async fn fetch_groups_page(
    pool: &PgPool,
    after: Option<Uuid>,
    limit: i64,
) -> Result<Vec<ProductGroup>, DbError> {
    let rows: Vec<GroupRow> = sqlx::query_as::<_, GroupRow>(&format!(
        "SELECT {GROUP_COLUMNS} FROM product_groups \
         WHERE ($1::uuid IS NULL OR id > $1) \
         ORDER BY id \
         LIMIT $2"
    ))
    .bind(after)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(GroupRow::into_group).collect()
}

/// Point lookup by group id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when no row exists, [`DbError::Sqlx`] on
/// query failure.
pub async fn get_group(pool: &PgPool, id: Uuid) -> Result<ProductGroup, DbError> {
    let row: Option<GroupRow> = sqlx::query_as::<_, GroupRow>(&format!(
        "SELECT {GROUP_COLUMNS} FROM product_groups WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)?.into_group()
}

/// Upsert one group with set semantics on the mutable fields. `created_at`
/// is only written on first insert.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_group(pool: &PgPool, group: &ProductGroup) -> Result<(), DbError> {
    let members = serde_json::to_value(&group.members)?;
    let member_count = i32::try_from(group.member_count()).unwrap_or(i32::MAX);

    sqlx::query(
        "INSERT INTO product_groups \
             (id, category, primary_name, primary_image, primary_weight, brand, \
              manually_verified, members, member_count, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (id) DO UPDATE SET \
             category          = EXCLUDED.category, \
             primary_name      = EXCLUDED.primary_name, \
             primary_image     = EXCLUDED.primary_image, \
             primary_weight    = EXCLUDED.primary_weight, \
             brand             = EXCLUDED.brand, \
             manually_verified = EXCLUDED.manually_verified, \
             members           = EXCLUDED.members, \
             member_count      = EXCLUDED.member_count, \
             updated_at        = NOW()",
    )
    .bind(group.id)
    .bind(&group.category)
    .bind(&group.primary_name)
    .bind(&group.primary_image)
    .bind(&group.primary_weight)
    .bind(&group.brand)
    .bind(group.manually_verified)
    .bind(members)
    .bind(member_count)
    .bind(group.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete groups by id. Missing ids are ignored.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_groups(pool: &PgPool, ids: &[Uuid]) -> Result<(), DbError> {
    if ids.is_empty() {
        return Ok(());
    }
    sqlx::query("DELETE FROM product_groups WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await?;
    Ok(())
}
