//! Database and group administration subcommands. Each mutating command
//! loads the full group cache, applies one operation, and flushes it back.

use anyhow::Context;
use pricewatch_core::{load_app_config_from_env, AppConfig, Platform};
use pricewatch_db::{connect_pool, run_migrations, PgStore, PoolConfig};
use pricewatch_grouping::{
    delete_group, merge_groups, remove_member, rename_group, GroupingStore,
};
use uuid::Uuid;

async fn open_store() -> anyhow::Result<(AppConfig, PgStore)> {
    let config = load_app_config_from_env().context("loading configuration")?;
    let pool = connect_pool(&config.database_url, PoolConfig::from_app_config(&config))
        .await
        .context("connecting to database")?;
    Ok((config, PgStore::new(pool)))
}

async fn load_cache(store: &PgStore) -> anyhow::Result<GroupingStore> {
    let mut cache = GroupingStore::new();
    let loaded = cache.load(store).await.context("loading group cache")?;
    tracing::info!(groups = loaded, "group cache loaded");
    Ok(cache)
}

async fn flush(
    cache: &mut GroupingStore,
    store: &PgStore,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let summary = cache
        .save_dirty_groups(store, config.flush_chunk_size)
        .await
        .context("flushing group changes")?;
    println!(
        "done: {} group(s) written, {} deleted",
        summary.upserted, summary.deleted
    );
    Ok(())
}

pub(crate) async fn run_migrate() -> anyhow::Result<()> {
    let (_, store) = open_store().await?;
    let applied = run_migrations(store.pool())
        .await
        .context("running migrations")?;
    println!("{applied} migration(s) applied");
    Ok(())
}

pub(crate) async fn run_list_groups(limit: usize) -> anyhow::Result<()> {
    let (_, store) = open_store().await?;
    let cache = load_cache(&store).await?;

    let mut groups: Vec<_> = cache.groups().collect();
    groups.sort_by(|a, b| {
        b.member_count()
            .cmp(&a.member_count())
            .then_with(|| a.id.cmp(&b.id))
    });

    println!("{} group(s) total", groups.len());
    for group in groups.into_iter().take(limit) {
        let verified = if group.manually_verified { " [verified]" } else { "" };
        println!(
            "{}  {:>2} member(s)  {} / {}{}",
            group.id,
            group.member_count(),
            group.category,
            group.primary_name,
            verified
        );
    }
    Ok(())
}

pub(crate) async fn run_merge_groups(source: Uuid, target: Uuid) -> anyhow::Result<()> {
    let (config, store) = open_store().await?;
    let mut cache = load_cache(&store).await?;

    merge_groups(&mut cache, source, target)?;
    tracing::info!(source = %source, target = %target, "merged groups");
    flush(&mut cache, &store, &config).await
}

pub(crate) async fn run_remove_member(
    group: Uuid,
    platform: &str,
    product_id: &str,
) -> anyhow::Result<()> {
    let platform: Platform = platform.parse()?;
    let (config, store) = open_store().await?;
    let mut cache = load_cache(&store).await?;

    remove_member(&mut cache, group, platform, product_id)?;
    tracing::info!(group = %group, platform = %platform, product_id, "removed member");
    flush(&mut cache, &store, &config).await
}

pub(crate) async fn run_rename_group(group: Uuid, name: &str) -> anyhow::Result<()> {
    let (config, store) = open_store().await?;
    let mut cache = load_cache(&store).await?;

    rename_group(&mut cache, group, name)?;
    tracing::info!(group = %group, name, "renamed group");
    flush(&mut cache, &store, &config).await
}

pub(crate) async fn run_delete_group(group: Uuid) -> anyhow::Result<()> {
    let (config, store) = open_store().await?;
    let mut cache = load_cache(&store).await?;

    delete_group(&mut cache, group)?;
    tracing::info!(group = %group, "deleted group");
    flush(&mut cache, &store, &config).await
}
