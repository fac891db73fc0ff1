//! reqwest-backed [`Fetcher`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::{FetchError, Fetcher, MediaResponse};
use crate::user_agent;

/// Timeout for listing and item pages (whole request, body included).
pub const PAGE_TIMEOUT_SECS: u64 = 10;

/// Connect timeout applied to every request, media streams included.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP fetcher backed by a pooled `reqwest::Client`.
///
/// Create it once and clone it freely; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    page_timeout: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher with the default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the TLS backend or system
    /// configuration prevents building the client.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeouts(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            Duration::from_secs(PAGE_TIMEOUT_SECS),
        )
    }

    /// Creates a fetcher with explicit timeouts.
    ///
    /// `page_timeout` bounds [`Fetcher::fetch_page`] only; media streams have
    /// no total timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the client cannot be built.
    #[instrument(level = "debug")]
    pub fn with_timeouts(
        connect_timeout: Duration,
        page_timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(|source| FetchError::ClientBuild { source })?;
        Ok(Self {
            client,
            page_timeout,
        })
    }

    async fn send(
        &self,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let mut request = self.client.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "non-success status");
            return Err(FetchError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self.send(url, Some(self.page_timeout)).await?;
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::network(url, e))?;
        debug!(bytes = body.len(), "page fetched");
        Ok(body)
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn open_stream(&self, url: &str) -> Result<MediaResponse, FetchError> {
        let response = self.send(url, None).await?;
        let content_length = response.content_length();
        let owned_url = url.to_string();
        let body = response
            .bytes_stream()
            .map_err(move |e| FetchError::stream(owned_url.as_str(), e.to_string()))
            .boxed();
        debug!(?content_length, "media stream opened");
        Ok(MediaResponse {
            content_length,
            body,
        })
    }
}
