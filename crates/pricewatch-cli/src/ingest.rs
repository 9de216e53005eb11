//! The `ingest` subcommand: read a scraped snapshot file and run one batch
//! through group resolution and snapshot persistence.

use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use pricewatch_core::{load_app_config_from_env, load_match_config_from_env, ScrapedItem};
use pricewatch_grouping::{ingest_batch, GroupingStore, IngestSummary, MemoryStore};

/// Chunk size used by dry runs, which have no configuration loaded.
const DRY_RUN_CHUNK_SIZE: usize = 500;

pub(crate) async fn run_ingest(
    file: &Path,
    pincode: &str,
    scraped_at: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("reading snapshot file {}", file.display()))?;
    let items: Vec<ScrapedItem> =
        serde_json::from_str(&raw).context("parsing snapshot file")?;
    let batch_ts: DateTime<Utc> = match scraped_at {
        Some(value) => value
            .parse()
            .context("parsing --scraped-at as RFC 3339")?,
        None => Utc::now(),
    };
    tracing::info!(
        records = items.len(),
        pincode,
        scraped_at = %batch_ts,
        dry_run,
        "starting ingest"
    );

    if dry_run {
        // Resolve against an empty in-memory store: shows what the batch
        // would create without touching the database. The matching knobs
        // still come from the environment so a dry run previews exactly
        // what a live run would do.
        let matching =
            load_match_config_from_env().context("loading matching configuration")?;
        let store = MemoryStore::new();
        let mut cache = GroupingStore::new();
        cache.load(&store).await?;
        let summary = ingest_batch(
            &store,
            &mut cache,
            &items,
            pincode,
            batch_ts,
            &matching,
            DRY_RUN_CHUNK_SIZE,
        )
        .await?;
        print_summary(&summary);
        println!("dry run: no database rows were written");
        return Ok(());
    }

    let config = load_app_config_from_env().context("loading configuration")?;
    let pool = pricewatch_db::connect_pool(
        &config.database_url,
        pricewatch_db::PoolConfig::from_app_config(&config),
    )
    .await
    .context("connecting to database")?;
    let store = pricewatch_db::PgStore::new(pool);

    let mut cache = GroupingStore::new();
    let loaded = cache.load(&store).await.context("loading group cache")?;
    tracing::info!(groups = loaded, "group cache loaded");

    let summary = ingest_batch(
        &store,
        &mut cache,
        &items,
        pincode,
        batch_ts,
        &config.matching,
        config.ingest_chunk_size,
    )
    .await
    .context("ingesting batch")?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &IngestSummary) {
    println!("processed:      {}", summary.processed);
    println!("inserted:       {}", summary.inserted);
    println!("duplicates:     {}", summary.duplicates);
    println!("groups created: {}", summary.groups_created);
    println!("groups flushed: {}", summary.groups_flushed);
}
