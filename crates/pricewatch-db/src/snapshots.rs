//! Bulk inserts into the `price_snapshots` table.

use chrono::{DateTime, Utc};
use pricewatch_core::SnapshotRecord;
use pricewatch_grouping::SnapshotInsertOutcome;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Unordered insert-many via `UNNEST`, tolerating rows rejected by the
/// uniqueness constraint over
/// `(category, pincode, platform, scraped_at, product_id)`.
///
/// Returns how many rows were actually inserted and how many were counted
/// as duplicates. Duplicates are expected when a batch is re-run and are
/// never an error.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert itself fails.
pub async fn insert_snapshots(
    pool: &PgPool,
    records: &[SnapshotRecord],
) -> Result<SnapshotInsertOutcome, DbError> {
    if records.is_empty() {
        return Ok(SnapshotInsertOutcome::default());
    }

    let mut group_ids: Vec<Uuid> = Vec::with_capacity(records.len());
    let mut categories: Vec<String> = Vec::with_capacity(records.len());
    let mut pincodes: Vec<String> = Vec::with_capacity(records.len());
    let mut platforms: Vec<String> = Vec::with_capacity(records.len());
    let mut product_ids: Vec<String> = Vec::with_capacity(records.len());
    let mut names: Vec<String> = Vec::with_capacity(records.len());
    let mut weights: Vec<Option<String>> = Vec::with_capacity(records.len());
    let mut prices: Vec<Option<Decimal>> = Vec::with_capacity(records.len());
    let mut mrps: Vec<Option<Decimal>> = Vec::with_capacity(records.len());
    let mut discounts: Vec<Option<f64>> = Vec::with_capacity(records.len());
    let mut ranks: Vec<i32> = Vec::with_capacity(records.len());
    let mut in_stocks: Vec<bool> = Vec::with_capacity(records.len());
    let mut ratings: Vec<Option<f64>> = Vec::with_capacity(records.len());
    let mut image_urls: Vec<Option<String>> = Vec::with_capacity(records.len());
    let mut product_urls: Vec<Option<String>> = Vec::with_capacity(records.len());
    let mut scraped_ats: Vec<DateTime<Utc>> = Vec::with_capacity(records.len());
    let mut is_ads: Vec<bool> = Vec::with_capacity(records.len());

    for record in records {
        group_ids.push(record.group_id);
        categories.push(record.category.clone());
        pincodes.push(record.pincode.clone());
        platforms.push(record.platform.as_str().to_string());
        product_ids.push(record.product_id.clone());
        names.push(record.name.clone());
        weights.push(record.weight.clone());
        prices.push(record.price);
        mrps.push(record.mrp);
        discounts.push(record.discount_percent);
        ranks.push(i32::try_from(record.rank).unwrap_or(i32::MAX));
        in_stocks.push(record.in_stock);
        ratings.push(record.rating);
        image_urls.push(record.image_url.clone());
        product_urls.push(record.product_url.clone());
        scraped_ats.push(record.scraped_at);
        is_ads.push(record.is_ad);
    }

    let result = sqlx::query(
        "INSERT INTO price_snapshots \
             (group_id, category, pincode, platform, product_id, name, weight, \
              price, mrp, discount_percent, rank, in_stock, rating, \
              image_url, product_url, scraped_at, is_ad) \
         SELECT * FROM UNNEST( \
             $1::uuid[], $2::text[], $3::text[], $4::text[], $5::text[], $6::text[], $7::text[], \
             $8::numeric[], $9::numeric[], $10::float8[], $11::int4[], $12::bool[], $13::float8[], \
             $14::text[], $15::text[], $16::timestamptz[], $17::bool[]) \
         ON CONFLICT (category, pincode, platform, scraped_at, product_id) DO NOTHING",
    )
    .bind(&group_ids)
    .bind(&categories)
    .bind(&pincodes)
    .bind(&platforms)
    .bind(&product_ids)
    .bind(&names)
    .bind(&weights)
    .bind(&prices)
    .bind(&mrps)
    .bind(&discounts)
    .bind(&ranks)
    .bind(&in_stocks)
    .bind(&ratings)
    .bind(&image_urls)
    .bind(&product_urls)
    .bind(&scraped_ats)
    .bind(&is_ads)
    .execute(pool)
    .await?;

    let inserted = usize::try_from(result.rows_affected()).unwrap_or(0);
    Ok(SnapshotInsertOutcome {
        inserted,
        duplicates: records.len().saturating_sub(inserted),
    })
}
