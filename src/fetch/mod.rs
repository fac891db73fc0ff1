//! HTTP fetching for listing pages, item pages and media bodies.
//!
//! [`Fetcher`] is the seam between the pipeline and the network. The
//! production implementation is [`HttpFetcher`]; tests substitute their own
//! implementations to count calls, inject failures or measure concurrency.
//!
//! # Example
//!
//! ```no_run
//! use ripper_core::fetch::{Fetcher, HttpFetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = HttpFetcher::new()?;
//! let html = fetcher.fetch_page("https://archive.org/download/example/").await?;
//! println!("{} bytes of HTML", html.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod error;

pub use client::{CONNECT_TIMEOUT_SECS, HttpFetcher, PAGE_TIMEOUT_SECS};
pub use error::FetchError;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

/// Body of a media response, yielded chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Bytes, FetchError>>;

/// An opened media response whose body has not been consumed yet.
pub struct MediaResponse {
    /// Value of the `Content-Length` header, when the server sent one.
    pub content_length: Option<u64>,
    /// The response body.
    pub body: ByteStream,
}

impl std::fmt::Debug for MediaResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaResponse")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Issues GET requests on behalf of the pipeline.
///
/// Implementations must report non-2xx statuses as
/// [`FetchError::HttpStatus`] rather than handing back an error page.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches a metadata page (listing or item page) as text, with a finite timeout.
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;

    /// Opens a streaming GET for a media file. Only the connect phase is bounded.
    async fn open_stream(&self, url: &str) -> Result<MediaResponse, FetchError>;
}
