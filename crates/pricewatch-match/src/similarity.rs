//! Blended name-similarity scoring.
//!
//! Token-set Jaccard overlap dominates the blend (brand/flavor words are the
//! reliable signal in grocery names); a normalized Levenshtein ratio over
//! the full normalized strings covers spelling drift. Pack-size digits
//! corrupt raw edit distance, which is why the character channel gets the
//! smaller weight.

use std::collections::HashSet;

use pricewatch_core::MatchConfig;

use crate::normalize::{name_tokens, normalize_name};

/// Jaccard overlap of two token sets; 0 when the union is empty.
#[must_use]
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    #[allow(clippy::cast_precision_loss)]
    {
        intersection as f64 / union as f64
    }
}

/// Blended similarity score in `[0, 1]` between two raw product names.
///
/// Symmetric in its arguments. Two empty names score the Levenshtein
/// channel at 1.0 but the Jaccard channel at 0, so empty strings never
/// clear an acceptance threshold by coincidence.
#[must_use]
pub fn combined_similarity(name_a: &str, name_b: &str, config: &MatchConfig) -> f64 {
    let tokens_a: HashSet<String> = name_tokens(name_a).into_iter().collect();
    let tokens_b: HashSet<String> = name_tokens(name_b).into_iter().collect();
    let token_score = jaccard(&tokens_a, &tokens_b);

    let edit_score = strsim::normalized_levenshtein(&normalize_name(name_a), &normalize_name(name_b));

    config.jaccard_weight * token_score + config.levenshtein_weight * edit_score
}

/// Cheap brand proxy: the first whitespace-delimited token of the *raw*
/// name, lowercased. Used as a pre-filter, never as part of the score.
#[must_use]
pub fn brand_of(raw_name: &str) -> String {
    raw_name
        .split_whitespace()
        .next()
        .map(str::to_lowercase)
        .unwrap_or_default()
}

/// Brand gate: two listings may match only if either brand is unknown or
/// one brand is a prefix of the other ("lay" vs "lay's" after lowercasing).
#[must_use]
pub fn brands_compatible(brand_a: &str, brand_b: &str) -> bool {
    if brand_a.is_empty() || brand_b.is_empty() {
        return true;
    }
    brand_a.starts_with(brand_b) || brand_b.starts_with(brand_a)
}
