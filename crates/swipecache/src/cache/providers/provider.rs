//! # Cache Provider
//!
//! The storage interface the download coordinator depends on.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

/// Key-value storage of video payloads addressed by resource URL.
///
/// None of these operations fail from the caller's point of view: storage
/// errors are logged and degrade to "not cached".
#[async_trait]
pub trait VideoCacheProvider: Send + Sync {
    /// Local path of the cached payload for `url`, if one exists right now.
    async fn lookup(&self, url: &Url) -> Option<PathBuf>;

    /// Store `payload` for `url`, overwriting any previous entry.
    /// `None` removes the entry instead.
    async fn insert(&self, payload: Option<Bytes>, url: &Url);

    /// Remove the entry for `url`. Removing an absent entry is a no-op.
    async fn delete(&self, url: &Url);

    /// Remove every entry, returning how many were removed.
    async fn delete_all(&self) -> usize;
}
