//! # Builder for FetchConfig
//!
//! Fluent construction of [`FetchConfig`] instances.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use swipecache_engine::FetchConfig;
//!
//! let config = FetchConfig::builder()
//!     .with_timeout(Duration::from_secs(120))
//!     .with_connect_timeout(Duration::from_secs(5))
//!     .with_user_agent("SwipeToWatch/1.0")
//!     .with_header("Referer", "https://feed.example")
//!     .build();
//!
//! assert_eq!(config.timeout, Duration::from_secs(120));
//! ```

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::FetchConfig;

/// Builder for creating FetchConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct FetchConfigBuilder {
    /// Internal config being built
    config: FetchConfig,
}

impl FetchConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: FetchConfig::default(),
        }
    }

    /// Set the overall timeout for the entire HTTP request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout (time to establish initial connection)
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set whether to follow redirects
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a custom HTTP header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.as_ref().parse::<reqwest::header::HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.config.headers.insert(name, value);
        }
        self
    }

    /// Merge headers into the current set, replacing same-named entries
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in headers.iter() {
            self.config.headers.insert(name.clone(), value.clone());
        }
        self
    }

    /// Build the FetchConfig instance
    pub fn build(self) -> FetchConfig {
        self.config
    }
}

impl Default for FetchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
