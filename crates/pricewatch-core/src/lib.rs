//! Shared domain types and configuration for the pricewatch workspace.

pub mod app_config;
pub mod config;
pub mod group;
pub mod listing;
pub mod platform;

pub use app_config::AppConfig;
pub use config::{load_app_config_from_env, load_match_config_from_env, ConfigError, MatchConfig};
pub use group::{GroupMember, ProductGroup, SnapshotRecord};
pub use listing::{MergedProduct, ProductListing, ScrapedItem};
pub use platform::Platform;
