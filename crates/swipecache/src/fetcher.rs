use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::{FetchConfig, FetchError};

/// Network collaborator that retrieves the raw bytes behind a URL.
#[async_trait]
pub trait VideoFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError>;
}

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &FetchConfig) -> Result<Client, FetchError> {
    let mut client_builder = Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    client_builder.build().map_err(FetchError::from)
}

/// HTTP(S) fetcher backed by reqwest. Any non-2xx response is a failure.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        Ok(Self::with_client(create_client(config)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VideoFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::UnsupportedScheme(url.scheme().to_owned()));
        }

        let request = self.client.get(url.clone()).build()?;
        debug!(url = %url, headers = ?request.headers(), "Request started");

        let response = self.client.execute(request).await?;
        let status = response.status();
        debug!(
            url = %url,
            status = %status,
            content_length = ?response.content_length(),
            "Response received"
        );

        if !status.is_success() {
            warn!(url = %url, status = %status, "Server rejected video request");
            return Err(FetchError::StatusCode(status));
        }

        Ok(response.bytes().await?)
    }
}
