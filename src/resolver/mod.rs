//! Media link resolution for item pages.
//!
//! An item page is a secondary page whose anchors include the actual media
//! file. [`VideoResolver`] fetches such a page and picks the first anchor
//! whose target ends in a recognized media extension. Resolution never fails
//! loudly: a page that cannot be fetched or carries no media link simply
//! resolves to `None`.

use std::sync::Arc;

use tracing::{debug, instrument, warn};
use url::Url;

use crate::cancel::CancellationFlag;
use crate::extract::{ExtractError, LinkExtractor};
use crate::fetch::{FetchError, Fetcher};

/// File suffixes recognized as downloadable video content.
pub const MEDIA_EXTENSIONS: [&str; 2] = [".mp4", ".mkv"];

/// Maximum number of item pages resolved at once.
pub const RESOLVE_CONCURRENCY: usize = 10;

/// Resolves item pages to their media URL.
pub struct VideoResolver {
    fetcher: Arc<dyn Fetcher>,
    cancel: CancellationFlag,
    extractor: LinkExtractor,
}

impl std::fmt::Debug for VideoResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoResolver")
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl VideoResolver {
    /// Creates a resolver that fetches through `fetcher` and honours `cancel`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] if the anchor selector cannot be built.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        cancel: CancellationFlag,
    ) -> Result<Self, ExtractError> {
        Ok(Self {
            fetcher,
            cancel,
            extractor: LinkExtractor::anywhere()?,
        })
    }

    /// Returns the first media link on `page_url`, or `None`.
    ///
    /// Performs no network I/O once cancellation has been requested.
    #[instrument(skip(self), fields(page = %page_url))]
    pub async fn resolve(&self, page_url: &str) -> Option<String> {
        if self.cancel.is_cancelled() {
            debug!("cancelled before fetch");
            return None;
        }

        let base = match Url::parse(page_url) {
            Ok(url) => url,
            Err(_) => {
                warn!(error = %FetchError::invalid_url(page_url), "Error fetching video link");
                return None;
            }
        };

        let document = match self.fetcher.fetch_page(page_url).await {
            Ok(document) => document,
            Err(e) => {
                warn!(page = %page_url, error = %e, "Error fetching video link");
                return None;
            }
        };

        let media = first_media_link(self.extractor.extract(&document, &base).into_links());
        match &media {
            Some(url) => debug!(media = %url, "media link found"),
            None => debug!("no media link on page"),
        }
        media
    }
}

/// Returns true when `url` ends in one of [`MEDIA_EXTENSIONS`] (case-insensitive).
#[must_use]
pub fn is_media_url(url: &str) -> bool {
    let lowered = url.to_lowercase();
    MEDIA_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext))
}

fn first_media_link(links: Vec<Url>) -> Option<String> {
    links
        .into_iter()
        .map(String::from)
        .find(|link| is_media_url(link))
}
