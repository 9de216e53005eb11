//! Persistent cross-platform product grouping.
//!
//! The document store behind the [`DocumentStore`] trait is the source of
//! truth; [`GroupingStore`] is a write-back cache over it with the member
//! and search indexes the resolver needs. One batch at a time mutates the
//! cache (single-writer discipline); reads during resolution always observe
//! earlier writes from the same batch.

pub mod error;
pub mod ingest;
pub mod memory;
pub mod resolver;
pub mod store;
pub mod store_api;

pub use error::GroupingError;
pub use ingest::{ingest_batch, IngestSummary};
pub use memory::MemoryStore;
pub use resolver::{
    delete_group, merge_groups, remove_member, rename_group, resolve_group_id, GroupAssignment,
};
pub use store::{FlushSummary, GroupingStore};
pub use store_api::{DocumentStore, SnapshotInsertOutcome};
