//! # Cache Types
//!
//! Key derivation and configuration for the disk cache.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use url::Url;

/// Name of the cache directory created under the configured root.
pub const DEFAULT_CACHE_DIR_NAME: &str = "VideoCache";

/// How a resource URL maps to a file name inside the cache directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum KeyStrategy {
    /// Use the URL's final path segment as the file name.
    ///
    /// Two distinct URLs sharing a file name (`https://a/x.mp4` and
    /// `https://b/x.mp4`) map to the same entry, and the later insert
    /// silently overwrites the earlier one.
    #[default]
    #[cfg_attr(feature = "clap", value(name = "last-segment"))]
    LastPathSegment,
    /// Use the SHA-256 of the full URL, keeping the file extension.
    #[cfg_attr(feature = "clap", value(name = "url-hash"))]
    UrlHash,
}

/// File name of a cache entry, derived deterministically from a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `url`, or `None` when the URL yields no usable
    /// file name (no path, `..`, and so on).
    pub fn from_url(url: &Url, strategy: KeyStrategy) -> Option<Self> {
        let last_segment = last_path_segment(url);

        let name = match strategy {
            KeyStrategy::LastPathSegment => last_segment?.to_owned(),
            KeyStrategy::UrlHash => {
                let digest = hex::encode(Sha256::digest(url.as_str().as_bytes()));
                match last_segment.and_then(extension_of) {
                    Some(ext) => format!("{digest}.{ext}"),
                    None => digest,
                }
            }
        };

        is_valid_file_name(&name).then_some(Self(name))
    }

    /// The file name this key occupies inside the cache directory.
    pub fn as_file_name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// Trailing slashes are ignored, so `https://host/videos/` yields `videos`.
fn last_path_segment(url: &Url) -> Option<&str> {
    url.path_segments()?.filter(|s| !s.is_empty()).next_back()
}

fn extension_of(segment: &str) -> Option<&str> {
    Path::new(segment)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
}

fn is_valid_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Configuration for the disk cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Parent of the cache directory. `None` means the platform temp dir.
    pub root_dir: Option<PathBuf>,
    /// Name of the dedicated directory created under `root_dir`
    pub dir_name: String,
    /// Key derivation used for every entry
    pub key_strategy: KeyStrategy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root_dir: None, // If None, we'll use system temp dir
            dir_name: DEFAULT_CACHE_DIR_NAME.to_owned(),
            key_strategy: KeyStrategy::default(),
        }
    }
}

impl CacheConfig {
    /// Config rooted at an explicit directory, with default naming.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: Some(root.into()),
            ..Self::default()
        }
    }

    pub fn with_key_strategy(mut self, key_strategy: KeyStrategy) -> Self {
        self.key_strategy = key_strategy;
        self
    }

    /// Effective cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.root_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
            .join(&self.dir_name)
    }
}
