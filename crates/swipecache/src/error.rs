use reqwest::StatusCode;

/// Failure of the network fetch collaborator.
///
/// The coordinator does not distinguish between variants: any of them means
/// "no local source available" for the request.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned status code {0}")]
    StatusCode(StatusCode),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Fetch failed: {0}")]
    Other(String),
}

/// Failure inside the disk cache. Never surfaced past the cache operations;
/// it is logged and degraded to "not cached".
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No cache key can be derived from URL: {0}")]
    InvalidKey(String),
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;
