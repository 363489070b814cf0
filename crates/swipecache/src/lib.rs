//! # Swipecache
//!
//! On-device video cache and download coordination for a vertically
//! swipeable short-video feed.
//!
//! ## Features
//!
//! - Content-addressed disk cache keyed by resource URL
//! - Serialized, FIFO download coordinator with cache-first resolution
//! - Pluggable network fetcher (reqwest by default)
//! - Playback source selection that streams remotely while the cache warms

pub mod builder;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetcher;

#[cfg(test)]
pub(crate) mod test_utils;

pub use builder::FetchConfigBuilder;
pub use cache::{CacheConfig, CacheKey, DiskCache, KeyStrategy, VideoCacheProvider};
pub use config::FetchConfig;
pub use error::{CacheError, FetchError};

// Re-export coordinator types
pub use coordinator::{DownloadCoordinator, PlaybackSource, Resolution, ResolveOutcome};

// Re-export fetcher utilities
pub use fetcher::{HttpFetcher, VideoFetcher, create_client};
