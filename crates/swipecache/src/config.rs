use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

const DEFAULT_USER_AGENT: &str = concat!("swipecache/", env!("CARGO_PKG_VERSION"));

/// Configurable options for the network fetcher
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Overall timeout for the entire HTTP request, zero disables it
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Custom HTTP headers for requests
    pub headers: HeaderMap,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            // Whole videos over mobile links can take minutes
            timeout: Duration::from_secs(600),
            connect_timeout: Duration::from_secs(10),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: FetchConfig::get_default_headers(),
        }
    }
}

impl FetchConfig {
    pub fn builder() -> crate::builder::FetchConfigBuilder {
        crate::builder::FetchConfigBuilder::new()
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("*/*"));

        default_headers.insert(
            reqwest::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );

        default_headers
    }
}
