//! Anchor extraction from HTML documents.
//!
//! [`LinkExtractor`] turns a document into the list of absolute URLs its
//! `<a href>` elements point at, optionally restricted to the first element
//! matching a scope selector (the directory-listing container on listing
//! pages).

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Selector for the container that holds a listing page's entries.
pub const DIRECTORY_LISTING_SCOPE: &str = ".download-directory-listing";

const ANCHOR_SELECTOR: &str = "a[href]";

/// Errors raised while building an extractor.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The CSS selector could not be parsed.
    #[error("invalid CSS selector {selector:?}: {message}")]
    InvalidSelector {
        /// The offending selector text.
        selector: String,
        /// Parser diagnostic.
        message: String,
    },
}

/// Result of running an extractor over one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Absolute link targets in document order, duplicates included.
    Links(Vec<Url>),
    /// A scope was requested but no element in the document matched it.
    ScopeMissing,
}

impl Extraction {
    /// Flattens the result, treating a missing scope as "no links".
    #[must_use]
    pub fn into_links(self) -> Vec<Url> {
        match self {
            Self::Links(links) => links,
            Self::ScopeMissing => Vec::new(),
        }
    }
}

/// Collects `href` targets from anchors, resolved against the page URL.
#[derive(Debug)]
pub struct LinkExtractor {
    scope: Option<Selector>,
    anchor: Selector,
}

impl LinkExtractor {
    /// Extractor that considers every anchor in the document.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the anchor selector is a constant.
    pub fn anywhere() -> Result<Self, ExtractError> {
        Ok(Self {
            scope: None,
            anchor: parse_selector(ANCHOR_SELECTOR)?,
        })
    }

    /// Extractor limited to anchors inside the first element matching `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidSelector`] if `scope` is not valid CSS.
    pub fn scoped(scope: &str) -> Result<Self, ExtractError> {
        Ok(Self {
            scope: Some(parse_selector(scope)?),
            anchor: parse_selector(ANCHOR_SELECTOR)?,
        })
    }

    /// Extracts anchors from `document`, resolving each href against `page_url`.
    ///
    /// Hrefs that cannot be joined to the page URL are skipped.
    #[must_use]
    pub fn extract(&self, document: &str, page_url: &Url) -> Extraction {
        let html = Html::parse_document(document);

        let root = match &self.scope {
            Some(scope) => match html.select(scope).next() {
                Some(container) => container,
                None => return Extraction::ScopeMissing,
            },
            None => html.root_element(),
        };

        Extraction::Links(self.collect_links(root, page_url))
    }

    fn collect_links(&self, root: ElementRef<'_>, page_url: &Url) -> Vec<Url> {
        root.select(&self.anchor)
            .filter_map(|anchor| anchor.value().attr("href"))
            .filter_map(|href| {
                let href = href.trim();
                match page_url.join(href) {
                    Ok(url) => Some(url),
                    Err(e) => {
                        debug!(%href, page = %page_url, error = %e, "skipping unresolvable href");
                        None
                    }
                }
            })
            .collect()
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}
