//! # Cache Providers
//!
//! The cache provider interface and its disk-backed implementation.

pub use self::disk::DiskCache;
pub use self::provider::VideoCacheProvider;

// Provider interface
pub mod provider;

pub mod disk;
