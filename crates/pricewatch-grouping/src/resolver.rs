//! Persistent group assignment and the admin operations on groups.
//!
//! Resolution is synchronous over the in-memory cache; all store I/O
//! happens at load and flush time. The resolver applies the same
//! brand-prefix gate as the stateless matcher: a wrong merge here is
//! durable, so the persistent path is at least as strict.

use chrono::Utc;
use pricewatch_core::{GroupMember, MatchConfig, Platform, ProductGroup, ProductListing};
use pricewatch_match::{brand_of, brands_compatible, combined_similarity, name_tokens, weights_match};
use uuid::Uuid;

use crate::error::GroupingError;
use crate::store::GroupingStore;

/// Outcome of resolving one scraped product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupAssignment {
    pub group_id: Uuid,
    /// `true` when the product minted a new group instead of joining one.
    pub created: bool,
}

/// Decide which persistent group a newly-scraped product belongs to,
/// creating one when nothing acceptable exists.
///
/// The exact `(platform, product_id)` short-circuit makes repeat scrapes
/// idempotent and cheap; fuzzy logic only runs for products never seen on
/// that platform before.
pub fn resolve_group_id(
    cache: &mut GroupingStore,
    listing: &ProductListing,
    category: &str,
    config: &MatchConfig,
) -> GroupAssignment {
    if let Some(group_id) = cache.member_group(listing.platform, &listing.product_id) {
        return GroupAssignment {
            group_id,
            created: false,
        };
    }

    if let Some(group_id) = best_existing_group(cache, listing, category, config) {
        if let Some(mut group) = cache.get(group_id).cloned() {
            group.add_member(GroupMember::new(listing.platform, listing.product_id.clone()));
            cache.set(group);
            return GroupAssignment {
                group_id,
                created: false,
            };
        }
    }

    let group = mint_group(listing, category);
    let group_id = group.id;
    tracing::debug!(group_id = %group_id, name = %listing.name, "minted new product group");
    cache.set(group);
    GroupAssignment {
        group_id,
        created: true,
    }
}

/// Fuzzy search for an acceptable existing group.
///
/// Shortlists via the inverted token index (first few name tokens), then
/// filters by category, weight compatibility, and the brand gate before
/// paying for the string comparison.
fn best_existing_group(
    cache: &GroupingStore,
    listing: &ProductListing,
    category: &str,
    config: &MatchConfig,
) -> Option<Uuid> {
    let tokens: Vec<String> = name_tokens(&listing.name)
        .into_iter()
        .take(config.candidate_token_limit)
        .collect();
    if tokens.is_empty() {
        return None;
    }

    let brand = brand_of(&listing.name);
    let mut best: Option<(Uuid, f64)> = None;

    for candidate_id in cache.candidates(&tokens) {
        // Stale index entries (e.g. after an unflushed delete) have no
        // backing group; skip them.
        let Some(group) = cache.get(candidate_id) else {
            continue;
        };
        if group.category != category {
            continue;
        }
        if !weights_match(listing.weight.as_deref(), group.primary_weight.as_deref()) {
            continue;
        }
        let group_brand = group
            .brand
            .clone()
            .unwrap_or_else(|| brand_of(&group.primary_name));
        if !brands_compatible(&brand, &group_brand) {
            continue;
        }

        let score = combined_similarity(&listing.name, &group.primary_name, config);
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((candidate_id, score));
        }
    }

    best.and_then(|(id, score)| (score >= config.accept_threshold).then_some(id))
}

fn mint_group(listing: &ProductListing, category: &str) -> ProductGroup {
    let brand = brand_of(&listing.name);
    ProductGroup {
        id: Uuid::new_v4(),
        category: category.to_string(),
        primary_name: listing.name.clone(),
        primary_image: listing.image_url.clone(),
        primary_weight: listing.weight.clone(),
        brand: (!brand.is_empty()).then_some(brand),
        manually_verified: false,
        members: vec![GroupMember::new(listing.platform, listing.product_id.clone())],
        created_at: Utc::now(),
    }
}

/// Move every member of `source` into `target`, mark `target` manually
/// verified, and dissolve `source`. Members present in both are
/// deduplicated.
///
/// # Errors
///
/// Returns [`GroupingError::MergeIntoSelf`] when both ids are equal and
/// [`GroupingError::GroupNotFound`] when either group is missing.
pub fn merge_groups(
    cache: &mut GroupingStore,
    source_id: Uuid,
    target_id: Uuid,
) -> Result<(), GroupingError> {
    if source_id == target_id {
        return Err(GroupingError::MergeIntoSelf(source_id));
    }
    let source = cache
        .get(source_id)
        .cloned()
        .ok_or(GroupingError::GroupNotFound(source_id))?;
    let mut target = cache
        .get(target_id)
        .cloned()
        .ok_or(GroupingError::GroupNotFound(target_id))?;

    for member in source.members {
        target.add_member(member);
    }
    target.manually_verified = true;

    // Indexing the enlarged target first repoints the moved members; the
    // deletion then only clears entries still owned by the source.
    cache.set(target);
    cache.delete(source_id);
    Ok(())
}

/// Remove one member from a group. An emptied group is deleted outright.
/// The removed product is not reassigned — it becomes eligible for fresh
/// matching on the next ingest.
///
/// # Errors
///
/// Returns [`GroupingError::GroupNotFound`] or
/// [`GroupingError::MemberNotFound`].
pub fn remove_member(
    cache: &mut GroupingStore,
    group_id: Uuid,
    platform: Platform,
    product_id: &str,
) -> Result<(), GroupingError> {
    let mut group = cache
        .get(group_id)
        .cloned()
        .ok_or(GroupingError::GroupNotFound(group_id))?;

    if !group.remove_member(platform, product_id) {
        return Err(GroupingError::MemberNotFound {
            group_id,
            platform: platform.to_string(),
            product_id: product_id.to_string(),
        });
    }

    cache.unindex_member(platform, product_id, group_id);
    if group.members.is_empty() {
        cache.delete(group_id);
    } else {
        cache.set(group);
    }
    Ok(())
}

/// Administrative rename of a group's primary display name. Old name tokens
/// are unindexed so the search index tracks the new name only.
///
/// # Errors
///
/// Returns [`GroupingError::GroupNotFound`] if the group does not exist.
pub fn rename_group(
    cache: &mut GroupingStore,
    group_id: Uuid,
    new_name: &str,
) -> Result<(), GroupingError> {
    let mut group = cache
        .get(group_id)
        .cloned()
        .ok_or(GroupingError::GroupNotFound(group_id))?;

    cache.unindex_name(&group.primary_name, group_id);
    group.primary_name = new_name.to_string();
    group.manually_verified = true;
    cache.set(group);
    Ok(())
}

/// Administrative deletion: dissolves the group entirely. Its members
/// become ungrouped and will be re-grouped on their next scrape.
///
/// # Errors
///
/// Returns [`GroupingError::GroupNotFound`] if the group does not exist.
pub fn delete_group(cache: &mut GroupingStore, group_id: Uuid) -> Result<(), GroupingError> {
    if cache.get(group_id).is_none() {
        return Err(GroupingError::GroupNotFound(group_id));
    }
    cache.delete(group_id);
    Ok(())
}
