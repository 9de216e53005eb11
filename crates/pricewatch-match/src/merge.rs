//! Greedy cross-platform merge of one scrape moment.
//!
//! Each platform's listings are scanned in a fixed priority order; every
//! not-yet-consumed listing seeds a [`MergedProduct`] and pulls in at most
//! one best-scoring listing from every other platform. Greedy and
//! order-dependent by design: the platform order affects tie-breaks, never
//! correctness, and callers pin it via [`Platform::MERGE_PRIORITY`].

use std::collections::BTreeMap;

use pricewatch_core::{MatchConfig, MergedProduct, Platform, ProductListing};

use crate::similarity::{brand_of, brands_compatible, combined_similarity};
use crate::weight::weights_match;

/// One platform's listings for a single scrape moment.
#[derive(Debug, Clone)]
pub struct PlatformListings {
    pub platform: Platform,
    pub listings: Vec<ProductListing>,
}

/// Arrange per-platform listing sets in the fixed merge priority order,
/// dropping platforms with no listings.
#[must_use]
pub fn in_priority_order(
    mut by_platform: BTreeMap<Platform, Vec<ProductListing>>,
) -> Vec<PlatformListings> {
    Platform::MERGE_PRIORITY
        .into_iter()
        .filter_map(|platform| {
            let listings = by_platform.remove(&platform)?;
            if listings.is_empty() {
                None
            } else {
                Some(PlatformListings { platform, listings })
            }
        })
        .collect()
}

/// Merge one scrape moment's per-platform listings into unified products.
///
/// Every input listing lands in exactly one output product. Output is
/// sorted descending by platform coverage (a display concern, stable so
/// seed order breaks ties).
#[must_use]
pub fn merge_platform_listings(
    inputs: Vec<PlatformListings>,
    config: &MatchConfig,
) -> Vec<MergedProduct> {
    // Consumed-slot bookkeeping: a listing is taken out of its slot exactly
    // once, either as a seed or as a match.
    let mut slots: Vec<Vec<Option<ProductListing>>> = inputs
        .iter()
        .map(|p| p.listings.iter().cloned().map(Some).collect())
        .collect();

    let mut merged: Vec<MergedProduct> = Vec::new();

    for seed_platform_idx in 0..inputs.len() {
        for seed_idx in 0..slots[seed_platform_idx].len() {
            let Some(seed) = slots[seed_platform_idx][seed_idx].take() else {
                continue;
            };
            let mut product = MergedProduct::seeded_from(seed);
            let seed_brand = brand_of(&product.display_name);

            for other_idx in 0..inputs.len() {
                if other_idx == seed_platform_idx {
                    continue;
                }

                let mut best: Option<(usize, f64)> = None;
                for (cand_idx, slot) in slots[other_idx].iter().enumerate() {
                    let Some(candidate) = slot else { continue };

                    if !brands_compatible(&seed_brand, &brand_of(&candidate.name)) {
                        continue;
                    }

                    let score =
                        combined_similarity(&product.display_name, &candidate.name, config);

                    // A weight mismatch is only forgiven for very strong
                    // name matches. The merged weight may have been
                    // backfilled by an earlier platform's match.
                    if !weights_match(product.weight.as_deref(), candidate.weight.as_deref())
                        && score < config.weight_override_threshold
                    {
                        continue;
                    }

                    if best.is_none_or(|(_, best_score)| score > best_score) {
                        best = Some((cand_idx, score));
                    }
                }

                if let Some((cand_idx, score)) = best {
                    if score >= config.accept_threshold {
                        if let Some(listing) = slots[other_idx][cand_idx].take() {
                            product.attach(listing);
                        }
                    }
                }
            }

            merged.push(product);
        }
    }

    // Safety net: anything still unconsumed becomes its own single-platform
    // product. Unreachable when the seed loop covers every platform, kept so
    // no listing can ever be dropped.
    for platform_slots in &mut slots {
        for slot in platform_slots.iter_mut() {
            if let Some(listing) = slot.take() {
                merged.push(MergedProduct::seeded_from(listing));
            }
        }
    }

    merged.sort_by(|a, b| b.platform_count().cmp(&a.platform_count()));
    merged
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;

    fn listing(platform: Platform, id: &str, name: &str, weight: Option<&str>) -> ProductListing {
        ProductListing {
            platform,
            product_id: id.to_string(),
            name: name.to_string(),
            weight: weight.map(str::to_string),
            price: Some(Decimal::new(2000, 2)),
            mrp: None,
            discount_percent: None,
            rank: 1,
            in_stock: true,
            rating: None,
            image_url: None,
            product_url: None,
            scraped_at: Utc::now(),
            is_ad: false,
        }
    }

    fn inputs(groups: Vec<(Platform, Vec<ProductListing>)>) -> Vec<PlatformListings> {
        groups
            .into_iter()
            .map(|(platform, listings)| PlatformListings { platform, listings })
            .collect()
    }

    #[test]
    fn cross_platform_merge_end_to_end() {
        let zepto = listing(
            Platform::Zepto,
            "z1",
            "Lays Classic Salted 52g",
            Some("52 g"),
        );
        let blinkit = listing(
            Platform::Blinkit,
            "b1",
            "Lays Classic Salted Chips 52g",
            Some("52g"),
        );
        let result = merge_platform_listings(
            inputs(vec![
                (Platform::Zepto, vec![zepto]),
                (Platform::Blinkit, vec![blinkit]),
                (Platform::Jiomart, vec![]),
            ]),
            &MatchConfig::default(),
        );

        assert_eq!(result.len(), 1);
        let product = &result[0];
        assert_eq!(product.platform_count(), 2);
        assert!(product.listing(Platform::Zepto).is_some());
        assert!(product.listing(Platform::Blinkit).is_some());
        assert!(product.listing(Platform::Jiomart).is_none());
        // Seed (zepto) supplied the canonical weight.
        assert_eq!(product.weight.as_deref(), Some("52 g"));
    }

    #[test]
    fn brand_gate_blocks_cross_brand_matches() {
        // Near-identical names, different brands: must never merge.
        let zepto = listing(Platform::Zepto, "z1", "Amul Fresh Milk 1l", Some("1l"));
        let blinkit = listing(
            Platform::Blinkit,
            "b1",
            "Britannia Fresh Milk 1l",
            Some("1l"),
        );
        let result = merge_platform_listings(
            inputs(vec![
                (Platform::Zepto, vec![zepto]),
                (Platform::Blinkit, vec![blinkit]),
            ]),
            &MatchConfig::default(),
        );

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|p| p.platform_count() == 1));
    }

    #[test]
    fn weight_mismatch_blocks_ordinary_matches() {
        let zepto = listing(Platform::Zepto, "z1", "Maggi Masala Noodles", Some("70g"));
        let blinkit = listing(
            Platform::Blinkit,
            "b1",
            "Maggi Masala Noodles Family Saver",
            Some("280g"),
        );
        let result = merge_platform_listings(
            inputs(vec![
                (Platform::Zepto, vec![zepto]),
                (Platform::Blinkit, vec![blinkit]),
            ]),
            &MatchConfig::default(),
        );

        // Weight-incompatible and the name score is below the override bar.
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn identical_names_override_weight_mismatch() {
        // Identical names score 1.0 ≥ the 0.8 override floor, so the listed
        // weights disagreeing (data-entry noise) does not block the merge.
        let zepto = listing(Platform::Zepto, "z1", "Tata Salt Iodised", Some("1kg"));
        let blinkit = listing(Platform::Blinkit, "b1", "Tata Salt Iodised", Some("500g"));
        let result = merge_platform_listings(
            inputs(vec![
                (Platform::Zepto, vec![zepto]),
                (Platform::Blinkit, vec![blinkit]),
            ]),
            &MatchConfig::default(),
        );

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].platform_count(), 2);
    }

    #[test]
    fn every_listing_lands_in_exactly_one_product() {
        let result = merge_platform_listings(
            inputs(vec![
                (
                    Platform::Zepto,
                    vec![
                        listing(Platform::Zepto, "z1", "Amul Salted Butter 500g", Some("500g")),
                        listing(Platform::Zepto, "z2", "Tata Salt 1kg", Some("1kg")),
                    ],
                ),
                (
                    Platform::Blinkit,
                    vec![
                        listing(Platform::Blinkit, "b1", "Amul Salted Butter 500g", Some("500 g")),
                        listing(Platform::Blinkit, "b2", "Fortune Sunflower Oil 1l", Some("1l")),
                    ],
                ),
            ]),
            &MatchConfig::default(),
        );

        let total: usize = result.iter().map(MergedProduct::platform_count).sum();
        assert_eq!(total, 4, "every input listing appears exactly once");

        let mut seen = std::collections::HashSet::new();
        for product in &result {
            for l in product.listings.values() {
                assert!(
                    seen.insert((l.platform, l.product_id.clone())),
                    "listing consumed twice"
                );
            }
        }
    }

    #[test]
    fn output_sorted_by_platform_coverage() {
        let result = merge_platform_listings(
            inputs(vec![
                (
                    Platform::Zepto,
                    vec![
                        listing(Platform::Zepto, "z1", "Fortune Sunflower Oil 1l", Some("1l")),
                        listing(Platform::Zepto, "z2", "Amul Salted Butter 500g", Some("500g")),
                    ],
                ),
                (
                    Platform::Blinkit,
                    vec![listing(
                        Platform::Blinkit,
                        "b1",
                        "Amul Salted Butter 500g",
                        Some("500 g"),
                    )],
                ),
            ]),
            &MatchConfig::default(),
        );

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].platform_count(), 2);
        assert_eq!(result[1].platform_count(), 1);
    }

    #[test]
    fn empty_name_listings_stay_single() {
        let zepto = listing(Platform::Zepto, "z1", "", None);
        let blinkit = listing(Platform::Blinkit, "b1", "", None);
        let result = merge_platform_listings(
            inputs(vec![
                (Platform::Zepto, vec![zepto]),
                (Platform::Blinkit, vec![blinkit]),
            ]),
            &MatchConfig::default(),
        );

        // Two empty names score only the Levenshtein channel (0.35 < 0.75).
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn in_priority_order_pins_platform_sequence() {
        let mut map = BTreeMap::new();
        map.insert(
            Platform::Instamart,
            vec![listing(Platform::Instamart, "i1", "Tata Salt", None)],
        );
        map.insert(
            Platform::Zepto,
            vec![listing(Platform::Zepto, "z1", "Tata Salt", None)],
        );
        map.insert(Platform::Dmart, vec![]);

        let ordered = in_priority_order(map);
        let platforms: Vec<Platform> = ordered.iter().map(|p| p.platform).collect();
        assert_eq!(platforms, vec![Platform::Zepto, Platform::Instamart]);
    }
}
