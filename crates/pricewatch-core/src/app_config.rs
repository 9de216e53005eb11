use crate::MatchConfig;

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Chunk size for batched snapshot inserts during ingest.
    pub ingest_chunk_size: usize,
    /// Chunk size for batched group upserts during a dirty flush.
    pub flush_chunk_size: usize,
    pub matching: MatchConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("ingest_chunk_size", &self.ingest_chunk_size)
            .field("flush_chunk_size", &self.flush_chunk_size)
            .field("matching", &self.matching)
            .finish()
    }
}
