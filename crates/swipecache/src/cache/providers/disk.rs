//! # Disk Cache
//!
//! File-backed cache provider. Every entry is a single file named by its
//! [`CacheKey`] inside one dedicated directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::types::{CacheConfig, CacheKey, KeyStrategy};
use crate::error::{CacheError, CacheResult};

use super::VideoCacheProvider;

/// State guarded by the cache lock.
#[derive(Debug, Default)]
struct DirState {
    /// Whether the cache directory has been created by this instance
    created: bool,
}

/// Disk-backed video cache.
///
/// All filesystem access goes through a single lock, held for exactly one
/// file operation per call. The directory is created lazily on first use.
#[derive(Debug)]
pub struct DiskCache {
    cache_dir: PathBuf,
    key_strategy: KeyStrategy,
    state: Mutex<DirState>,
}

impl DiskCache {
    /// Create a disk cache for the given configuration. Nothing touches the
    /// filesystem until the first operation.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            cache_dir: config.cache_dir(),
            key_strategy: config.key_strategy,
            state: Mutex::new(DirState::default()),
        }
    }

    /// Directory holding the cache entries.
    pub fn root(&self) -> &Path {
        &self.cache_dir
    }

    /// Key the given URL is stored under, if any.
    pub fn key_for(&self, url: &Url) -> Option<CacheKey> {
        CacheKey::from_url(url, self.key_strategy)
    }

    /// Copy an existing local file into the cache under `url`'s key.
    pub async fn insert_file(&self, source: &Path, url: &Url) {
        match fs::read(source).await {
            Ok(data) => self.insert(Some(Bytes::from(data)), url).await,
            Err(e) => {
                warn!(source = ?source, url = %url, error = %e, "Failed to read file for caching");
            }
        }
    }

    async fn ensure_dir(&self, state: &mut DirState) -> io::Result<()> {
        if !state.created {
            fs::create_dir_all(&self.cache_dir).await?;
            state.created = true;
        }
        Ok(())
    }

    fn entry_path(&self, url: &Url) -> CacheResult<PathBuf> {
        let key = self
            .key_for(url)
            .ok_or_else(|| CacheError::InvalidKey(url.to_string()))?;
        Ok(self.cache_dir.join(key.as_file_name()))
    }

    async fn try_lookup(&self, state: &mut DirState, url: &Url) -> CacheResult<Option<PathBuf>> {
        let path = self.entry_path(url)?;
        self.ensure_dir(state).await?;

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(path)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn try_insert(&self, state: &mut DirState, data: &[u8], url: &Url) -> CacheResult<()> {
        let path = self.entry_path(url)?;
        self.ensure_dir(state).await?;

        match write_entry(&path, data).await {
            // The platform may purge the temp area behind our back
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(dir = ?self.cache_dir, "Cache directory vanished, recreating");
                state.created = false;
                self.ensure_dir(state).await?;
                write_entry(&path, data).await?;
            }
            result => result?,
        }

        debug!(url = %url, path = ?path, size = data.len(), "Cached video");
        Ok(())
    }

    async fn try_delete(&self, url: &Url) -> CacheResult<()> {
        let path = self.entry_path(url)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(url = %url, path = ?path, "Removed cached video");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Fixed-length name for the in-progress copy of `file_name`, so keys up to
/// the filesystem's name limit still get a valid sibling.
fn temp_file_name(file_name: &str) -> String {
    let digest = hex::encode(Sha256::digest(file_name.as_bytes()));
    format!(".{}.part", &digest[..16])
}

/// Write to a hidden sibling first, then rename into place.
async fn write_entry(path: &Path, data: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let temp_path = path.with_file_name(temp_file_name(file_name));

    fs::write(&temp_path, data).await?;

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }
    Ok(())
}

/// List the entries of `dir` as `(path, is_dir)` pairs.
///
/// Unreadable entries are logged and skipped; the stream ends after a read
/// error, so whatever was listed before it is still returned.
async fn list_entries(dir: &Path) -> io::Result<Vec<(PathBuf, bool)>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut listed = Vec::new();

    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
                listed.push((entry.path(), is_dir));
            }
            Ok(None) => break,
            Err(e) => {
                warn!(dir = ?dir, error = %e, "Failed to read cache directory entry");
            }
        }
    }

    Ok(listed)
}

/// Remove every listed entry, continuing past failures. Returns how many
/// were removed.
async fn remove_entries(entries: &[(PathBuf, bool)]) -> usize {
    let mut removed = 0;

    for (path, is_dir) in entries {
        let result = if *is_dir {
            fs::remove_dir_all(path).await
        } else {
            fs::remove_file(path).await
        };

        match result {
            Ok(()) => {
                debug!(path = ?path, "Removed cache file");
                removed += 1;
            }
            Err(e) => warn!(path = ?path, error = %e, "Failed to remove cache file"),
        }
    }

    removed
}

#[async_trait]
impl VideoCacheProvider for DiskCache {
    async fn lookup(&self, url: &Url) -> Option<PathBuf> {
        let mut state = self.state.lock().await;

        match self.try_lookup(&mut state, url).await {
            Ok(found) => found,
            Err(CacheError::InvalidKey(_)) => {
                debug!(url = %url, "URL has no cache key, treating as miss");
                None
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Cache lookup failed");
                None
            }
        }
    }

    async fn insert(&self, payload: Option<Bytes>, url: &Url) {
        let Some(data) = payload else {
            return self.delete(url).await;
        };

        let mut state = self.state.lock().await;
        match self.try_insert(&mut state, &data, url).await {
            Ok(()) => {}
            Err(CacheError::InvalidKey(_)) => {
                debug!(url = %url, "URL has no cache key, not storing");
            }
            Err(e) => warn!(url = %url, error = %e, "Failed to cache video"),
        }
    }

    async fn delete(&self, url: &Url) {
        let _state = self.state.lock().await;

        match self.try_delete(url).await {
            Ok(()) | Err(CacheError::InvalidKey(_)) => {}
            Err(e) => warn!(url = %url, error = %e, "Failed to remove cached video"),
        }
    }

    async fn delete_all(&self) -> usize {
        let _state = self.state.lock().await;

        let entries = match list_entries(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return 0,
            Err(e) => {
                warn!(dir = ?self.cache_dir, error = %e, "Failed to read cache directory");
                return 0;
            }
        };

        let removed = remove_entries(&entries).await;
        info!(count = removed, dir = ?self.cache_dir, "Cleared video cache");
        removed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;
    use crate::test_utils::init_test_tracing;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn cache_in(dir: &TempDir) -> DiskCache {
        DiskCache::new(&CacheConfig::with_root(dir.path()))
    }

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_directory_created_lazily() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        assert!(!cache.root().exists());

        assert!(cache.lookup(&url("https://host/a.mp4")).await.is_none());
        assert!(cache.root().is_dir());
    }

    #[tokio::test]
    async fn test_insert_lookup_delete_scenario() {
        init_test_tracing();
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let u = url("https://host/video123.mp4");

        cache
            .insert(Some(Bytes::from_static(&[0x01, 0x02, 0x03])), &u)
            .await;

        let path = cache.lookup(&u).await.expect("entry after insert");
        assert_eq!(std::fs::read(&path).unwrap(), vec![0x01, 0x02, 0x03]);
        assert_eq!(path, cache.root().join("video123.mp4"));

        cache.delete(&u).await;
        assert!(cache.lookup(&u).await.is_none());
    }

    #[tokio::test]
    async fn test_insert_twice_leaves_one_entry() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let u = url("https://host/clip.mp4");
        let payload = Bytes::from_static(b"same payload");

        cache.insert(Some(payload.clone()), &u).await;
        cache.insert(Some(payload.clone()), &u).await;

        assert_eq!(file_count(cache.root()), 1);
        let path = cache.lookup(&u).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), payload.to_vec());
    }

    #[tokio::test]
    async fn test_insert_overwrites() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let u = url("https://host/clip.mp4");

        cache.insert(Some(Bytes::from_static(b"old")), &u).await;
        cache.insert(Some(Bytes::from_static(b"newer")), &u).await;

        let path = cache.lookup(&u).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"newer");
    }

    #[tokio::test]
    async fn test_shared_file_name_overwrites_across_hosts() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let a = url("https://a.example/x.mp4");
        let b = url("https://b.example/x.mp4");

        cache.insert(Some(Bytes::from_static(b"from a")), &a).await;
        cache.insert(Some(Bytes::from_static(b"from b")), &b).await;

        let path = cache.lookup(&a).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"from b");
        assert_eq!(file_count(cache.root()), 1);
    }

    #[tokio::test]
    async fn test_url_hash_keeps_hosts_apart() {
        let tmp = TempDir::new().unwrap();
        let config = CacheConfig::with_root(tmp.path()).with_key_strategy(KeyStrategy::UrlHash);
        let cache = DiskCache::new(&config);
        let a = url("https://a.example/x.mp4");
        let b = url("https://b.example/x.mp4");

        cache.insert(Some(Bytes::from_static(b"from a")), &a).await;
        cache.insert(Some(Bytes::from_static(b"from b")), &b).await;

        let path = cache.lookup(&a).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"from a");
        assert_eq!(file_count(cache.root()), 2);
    }

    #[tokio::test]
    async fn test_insert_none_removes_entry() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let u = url("https://host/clip.mp4");

        cache.insert(Some(Bytes::from_static(b"data")), &u).await;
        assert!(cache.lookup(&u).await.is_some());

        cache.insert(None, &u).await;
        assert!(cache.lookup(&u).await.is_none());
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let u = url("https://host/never-cached.mp4");

        cache.delete(&u).await;
        assert!(cache.lookup(&u).await.is_none());
    }

    #[tokio::test]
    async fn test_delete_all_clears_everything() {
        init_test_tracing();
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let urls: Vec<Url> = (0..5)
            .map(|i| url(&format!("https://host/video{i}.mp4")))
            .collect();

        for (i, u) in urls.iter().enumerate() {
            cache.insert(Some(Bytes::from(vec![i as u8; 16])), u).await;
        }

        assert_eq!(cache.delete_all().await, urls.len());
        for u in &urls {
            assert!(cache.lookup(u).await.is_none());
        }
        assert!(cache.root().is_dir(), "directory itself survives a clear");
    }

    #[tokio::test]
    async fn test_delete_all_on_empty_cache() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);

        assert_eq!(cache.delete_all().await, 0);

        cache.lookup(&url("https://host/a.mp4")).await;
        assert_eq!(cache.delete_all().await, 0);
    }

    #[tokio::test]
    async fn test_url_without_key_is_never_cached() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let u = url("https://host/");

        cache.insert(Some(Bytes::from_static(b"data")), &u).await;
        assert!(cache.lookup(&u).await.is_none());
        assert_eq!(file_count(cache.root()), 0);
    }

    #[tokio::test]
    async fn test_insert_recreates_purged_directory() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let u = url("https://host/clip.mp4");

        cache.insert(Some(Bytes::from_static(b"first")), &u).await;
        std::fs::remove_dir_all(cache.root()).unwrap();

        cache.insert(Some(Bytes::from_static(b"second")), &u).await;
        let path = cache.lookup(&u).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_insert_file_copies_contents() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let source = tmp.path().join("download.bin");
        std::fs::write(&source, b"local bytes").unwrap();
        let u = url("https://host/imported.mp4");

        cache.insert_file(&source, &u).await;

        let path = cache.lookup(&u).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"local bytes");
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_insert_file_missing_source_is_soft() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let u = url("https://host/imported.mp4");

        cache.insert_file(&tmp.path().join("missing.bin"), &u).await;
        assert!(cache.lookup(&u).await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_inserts_leave_no_partial_files() {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(cache_in(&tmp));
        let u = url("https://host/contended.mp4");

        let tasks: Vec<_> = (0..8u8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                let u = u.clone();
                tokio::spawn(async move {
                    cache.insert(Some(Bytes::from(vec![i; 1024])), &u).await;
                })
            })
            .collect();
        for task in futures::future::join_all(tasks).await {
            task.unwrap();
        }

        assert_eq!(file_count(cache.root()), 1);
        let data = std::fs::read(cache.lookup(&u).await.unwrap()).unwrap();
        assert_eq!(data.len(), 1024);
        assert!(data.iter().all(|b| *b == data[0]));
    }

    #[tokio::test]
    async fn test_insert_key_at_name_limit() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let name = format!("{}.mp4", "a".repeat(248));
        assert_eq!(name.len(), 252);
        let u = url(&format!("https://host/{name}"));

        cache.insert(Some(Bytes::from_static(b"data")), &u).await;

        let path = cache.lookup(&u).await.expect("long key is stored");
        assert_eq!(path, cache.root().join(&name));
        assert_eq!(std::fs::read(path).unwrap(), b"data");
        assert_eq!(file_count(cache.root()), 1);
    }

    #[test]
    fn test_temp_file_name_is_fixed_length() {
        let short = temp_file_name("a.mp4");
        let long = temp_file_name(&"b".repeat(255));

        assert_eq!(short.len(), long.len());
        assert!(short.starts_with('.') && short.ends_with(".part"));
        assert_ne!(short, temp_file_name("c.mp4"));
    }

    #[tokio::test]
    async fn test_unusable_directory_degrades() {
        init_test_tracing();
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"occupied").unwrap();
        let cache = DiskCache::new(&CacheConfig {
            dir_name: "not-a-dir".to_owned(),
            ..CacheConfig::with_root(tmp.path())
        });
        assert_eq!(cache.root(), blocker.as_path());
        let u = url("https://host/clip.mp4");

        assert!(cache.lookup(&u).await.is_none());
        cache.insert(Some(Bytes::from_static(b"data")), &u).await;
        assert!(cache.lookup(&u).await.is_none());
        cache.delete(&u).await;
        assert_eq!(cache.delete_all().await, 0);

        assert_eq!(std::fs::read(&blocker).unwrap(), b"occupied");
    }

    #[tokio::test]
    async fn test_remove_entries_continues_past_failures() {
        init_test_tracing();
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("first.mp4");
        let vanished = tmp.path().join("vanished.mp4");
        let nested = tmp.path().join("nested");
        let last = tmp.path().join("last.mp4");
        std::fs::write(&first, b"1").unwrap();
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("inner.bin"), b"2").unwrap();
        std::fs::write(&last, b"3").unwrap();

        let entries = vec![
            (first.clone(), false),
            (vanished, false),
            (nested.clone(), true),
            (last.clone(), false),
        ];

        assert_eq!(remove_entries(&entries).await, 3);
        assert!(!first.exists());
        assert!(!nested.exists());
        assert!(!last.exists());
    }

    #[tokio::test]
    async fn test_delete_all_removes_subdirectories() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let u = url("https://host/clip.mp4");

        cache.insert(Some(Bytes::from_static(b"data")), &u).await;
        std::fs::create_dir(cache.root().join("stray")).unwrap();

        assert_eq!(cache.delete_all().await, 2);
        assert_eq!(file_count(cache.root()), 0);
    }

    #[tokio::test]
    async fn test_keyless_url_is_quiet_noop() {
        let tmp = TempDir::new().unwrap();
        let cache = cache_in(&tmp);
        let keyless = url("https://host/");

        assert!(cache.lookup(&keyless).await.is_none());
        assert!(!cache.root().exists(), "keyless lookup touches nothing");

        let u = url("https://host/kept.mp4");
        cache.insert(Some(Bytes::from_static(b"data")), &u).await;
        cache.delete(&keyless).await;
        assert!(cache.lookup(&u).await.is_some());
    }
}
