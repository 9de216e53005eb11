//! The `merge-search` subcommand: a purely in-memory merge of one scrape
//! moment's per-platform listings, printed as JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use pricewatch_core::{load_match_config_from_env, Platform, ProductListing};
use pricewatch_match::{in_priority_order, merge_platform_listings};

pub(crate) fn run_merge_search(file: &Path) -> anyhow::Result<()> {
    let matching = load_match_config_from_env().context("loading matching configuration")?;
    let raw = fs::read_to_string(file)
        .with_context(|| format!("reading listing file {}", file.display()))?;
    let by_platform: BTreeMap<Platform, Vec<ProductListing>> =
        serde_json::from_str(&raw).context("parsing listing file")?;

    let inputs = in_priority_order(by_platform);
    let merged = merge_platform_listings(inputs, &matching);
    tracing::info!(products = merged.len(), "merge complete");

    println!("{}", serde_json::to_string_pretty(&merged)?);
    Ok(())
}
