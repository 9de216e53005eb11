//! Stateless product matching: name/weight normalization, similarity
//! scoring, and the greedy cross-platform merge used for display-time
//! result sets.
//!
//! Everything in this crate is a pure function over in-memory data; the
//! persistent grouping side lives in `pricewatch-grouping` and reuses the
//! same scorer.

pub mod merge;
pub mod normalize;
pub mod similarity;
pub mod weight;

pub use merge::{in_priority_order, merge_platform_listings, PlatformListings};
pub use normalize::{name_tokens, normalize_name};
pub use similarity::{brand_of, brands_compatible, combined_similarity};
pub use weight::{normalize_weight, weights_match};
