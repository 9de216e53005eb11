//! In-memory write-back cache over the persistent group store.
//!
//! Loaded once per process, mutated by one ingest batch at a time, flushed
//! in chunks. The derived indexes are rebuildable from the primary map and
//! must never point at members or groups the primary map no longer holds;
//! the explicit removal paths keep them in sync.

use std::collections::{HashMap, HashSet};

use pricewatch_core::{GroupMember, Platform, ProductGroup};
use uuid::Uuid;

use crate::error::GroupingError;
use crate::store_api::DocumentStore;

/// Page size for the initial streaming load.
const LOAD_PAGE_SIZE: i64 = 1000;

/// Minimum token length indexed for candidate search.
const SEARCH_TOKEN_MIN_LEN: usize = 3;

/// Result of one dirty flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    pub upserted: usize,
    pub deleted: usize,
}

#[derive(Debug, Default)]
pub struct GroupingStore {
    groups: HashMap<Uuid, ProductGroup>,
    /// `(platform, product_id)` → owning group. Enforces at-most-one-group
    /// membership per platform-scoped product id.
    member_index: HashMap<GroupMember, Uuid>,
    /// Inverted index over primary-name tokens (len ≥ 3) for candidate
    /// shortlisting without a full scan.
    search_index: HashMap<String, HashSet<Uuid>>,
    dirty: HashSet<Uuid>,
    deleted: HashSet<Uuid>,
    loaded: bool,
}

impl GroupingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Stream every group from the store into the cache, building both
    /// indexes as records arrive. Idempotent: a second call is a no-op.
    ///
    /// Returns the number of groups loaded by this call.
    ///
    /// # Errors
    ///
    /// Returns [`GroupingError::Store`] if a page read fails.
    pub async fn load<S: DocumentStore>(&mut self, store: &S) -> Result<usize, GroupingError> {
        if self.loaded {
            return Ok(0);
        }

        let mut after: Option<Uuid> = None;
        let mut total = 0usize;
        loop {
            let page = store
                .fetch_groups_page(after, LOAD_PAGE_SIZE)
                .await
                .map_err(GroupingError::store)?;
            if page.is_empty() {
                break;
            }
            after = page.last().map(|g| g.id);
            for group in page {
                self.index_group(&group);
                self.groups.insert(group.id, group);
                total += 1;
                if total % 10_000 == 0 {
                    tracing::info!(loaded = total, "loading product groups");
                }
            }
        }

        self.loaded = true;
        tracing::info!(groups = total, "product group cache loaded");
        Ok(total)
    }

    #[must_use]
    pub fn get(&self, group_id: Uuid) -> Option<&ProductGroup> {
        self.groups.get(&group_id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &ProductGroup> {
        self.groups.values()
    }

    /// The group currently owning `(platform, product_id)`, if any.
    #[must_use]
    pub fn member_group(&self, platform: Platform, product_id: &str) -> Option<Uuid> {
        // Keyed lookup without allocating: GroupMember is the key type, so
        // build a probe.
        let probe = GroupMember::new(platform, product_id);
        self.member_index.get(&probe).copied()
    }

    /// Union of candidate group ids indexed under any of `tokens`.
    #[must_use]
    pub fn candidates(&self, tokens: &[String]) -> HashSet<Uuid> {
        let mut out = HashSet::new();
        for token in tokens {
            if let Some(ids) = self.search_index.get(token) {
                out.extend(ids.iter().copied());
            }
        }
        out
    }

    /// Write a group into the cache: updates the primary map, marks it
    /// dirty, and re-adds its index contributions. Indexing is additive —
    /// removal paths must call the explicit unindex helpers.
    pub fn set(&mut self, group: ProductGroup) {
        self.dirty.insert(group.id);
        self.deleted.remove(&group.id);
        self.index_group(&group);
        self.groups.insert(group.id, group);
    }

    /// Drop a group from the cache and schedule its deletion at the next
    /// flush. Its index entries are removed eagerly so it can never surface
    /// as a candidate again.
    pub fn delete(&mut self, group_id: Uuid) {
        if let Some(group) = self.groups.remove(&group_id) {
            self.unindex_group(&group);
        }
        self.dirty.remove(&group_id);
        self.deleted.insert(group_id);
    }

    /// Remove a single member-index entry if it points at `group_id`.
    pub(crate) fn unindex_member(&mut self, platform: Platform, product_id: &str, group_id: Uuid) {
        let probe = GroupMember::new(platform, product_id);
        if self.member_index.get(&probe) == Some(&group_id) {
            self.member_index.remove(&probe);
        }
    }

    /// Remove the search-index contributions of `name` for `group_id`.
    pub(crate) fn unindex_name(&mut self, name: &str, group_id: Uuid) {
        for token in search_tokens(name) {
            if let Some(ids) = self.search_index.get_mut(&token) {
                ids.remove(&group_id);
                if ids.is_empty() {
                    self.search_index.remove(&token);
                }
            }
        }
    }

    fn index_group(&mut self, group: &ProductGroup) {
        for member in &group.members {
            self.member_index.insert(member.clone(), group.id);
        }
        for token in search_tokens(&group.primary_name) {
            self.search_index.entry(token).or_default().insert(group.id);
        }
    }

    fn unindex_group(&mut self, group: &ProductGroup) {
        for member in &group.members {
            self.unindex_member(member.platform, &member.product_id, group.id);
        }
        let name = group.primary_name.clone();
        self.unindex_name(&name, group.id);
    }

    /// Flush every dirty group (chunked upserts) and every pending deletion
    /// to the store. The tracking sets are cleared only after all writes
    /// succeed, so a failed flush can simply be retried — re-upserting
    /// already-flushed chunks is idempotent.
    ///
    /// Safe to call with nothing dirty (no-op).
    ///
    /// # Errors
    ///
    /// Returns [`GroupingError::Store`] on any write failure; the dirty and
    /// deleted sets are left intact in that case.
    pub async fn save_dirty_groups<S: DocumentStore>(
        &mut self,
        store: &S,
        chunk_size: usize,
    ) -> Result<FlushSummary, GroupingError> {
        if self.dirty.is_empty() && self.deleted.is_empty() {
            return Ok(FlushSummary::default());
        }

        let dirty_groups: Vec<ProductGroup> = self
            .dirty
            .iter()
            .filter_map(|id| self.groups.get(id).cloned())
            .collect();

        let chunk_size = chunk_size.max(1);
        for chunk in dirty_groups.chunks(chunk_size) {
            store
                .upsert_groups(chunk)
                .await
                .map_err(GroupingError::store)?;
        }

        let deleted_ids: Vec<Uuid> = self.deleted.iter().copied().collect();
        if !deleted_ids.is_empty() {
            store
                .delete_groups(&deleted_ids)
                .await
                .map_err(GroupingError::store)?;
        }

        let summary = FlushSummary {
            upserted: dirty_groups.len(),
            deleted: deleted_ids.len(),
        };
        self.dirty.clear();
        self.deleted.clear();
        tracing::debug!(
            upserted = summary.upserted,
            deleted = summary.deleted,
            "flushed dirty groups"
        );
        Ok(summary)
    }
}

/// Tokens of a primary name worth indexing: normalized, length ≥ 3.
fn search_tokens(name: &str) -> Vec<String> {
    pricewatch_match::name_tokens(name)
        .into_iter()
        .filter(|t| t.len() >= SEARCH_TOKEN_MIN_LEN)
        .collect()
}
