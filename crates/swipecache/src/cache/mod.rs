//! # Cache System
//!
//! Durable storage of fetched video payloads, keyed by resource URL and
//! backed by a single dedicated directory. Presence of a file at the derived
//! path is the whole index: no metadata sidecars, no TTL, no size-based
//! eviction. Entries leave the cache only through explicit deletion.

pub mod providers;
mod types;

pub use types::{CacheConfig, CacheKey, DEFAULT_CACHE_DIR_NAME, KeyStrategy};

pub use providers::{DiskCache, VideoCacheProvider};
