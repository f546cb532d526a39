//! Diddymeter Server Library
//!
//! Scores streaming tracks and playlists by how much of their attribution
//! involves blacklisted contributors. The modules are exposed for the binary
//! and for integration tests.

pub mod blacklist;
pub mod cache_store;
pub mod config;
pub mod gateway;
pub mod musicbrainz;
pub mod pipeline;
pub mod scoring;
pub mod server;
pub mod spotify;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use blacklist::{BlacklistSource, FileBlacklistSource, StaticBlacklistSource};
pub use cache_store::{CacheStore, InMemoryCacheStore, SqliteCacheStore};
pub use gateway::{CacheGateway, RequestThrottle};
pub use pipeline::{PageRequest, PageResult, TrackPipeline};
pub use server::{run_server, RequestsLoggingLevel};
