//! Pagination types

use crate::error::Result;
use crate::http::Request;
use crate::link::PageDescriptor;
use crate::pipeline::Context;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// A lazy, ordered sequence of decoded pages
pub type PageStream<T> = Pin<Box<dyn Stream<Item = Result<T>> + Send>>;

/// Number of available processing units, at least 1
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_discovery_limit() -> u32 {
    10_000
}

/// Pagination settings shared by both paginators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Requests in flight in a concurrent run
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Hard cap on pages fetched, counting the first; 0 = unlimited
    #[serde(default)]
    pub max_pages: u32,
    /// Query parameter carrying the page number
    #[serde(default = "default_page_param")]
    pub page_param: String,
    /// Cap on pages found by following `next` links when no page count is
    /// advertised
    #[serde(default = "default_discovery_limit")]
    pub discovery_limit: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_pages: 0,
            page_param: default_page_param(),
            discovery_limit: default_discovery_limit(),
        }
    }
}

impl PaginationConfig {
    /// `max_pages` as an inclusive upper page index
    pub(crate) fn page_cap(max_pages: u32) -> u32 {
        if max_pages == 0 {
            u32::MAX
        } else {
            max_pages
        }
    }
}

/// State owned by one sequential run
#[derive(Debug, Clone)]
pub struct PaginationState {
    /// Page the next pull fetches
    pub current: PageDescriptor,
    /// Request for `current`; `None` once exhausted
    pub pending: Option<Request>,
    /// Per-call context applied to every page
    pub context: Context,
}

impl PaginationState {
    pub fn new(request: Request, context: Context) -> Self {
        Self {
            current: PageDescriptor::first(request.full_url()),
            pending: Some(request),
            context,
        }
    }

    /// Whether no further page will be fetched
    pub fn is_exhausted(&self) -> bool {
        self.pending.is_none()
    }

    /// Move to the page at `next`, or finish when there is none
    pub(crate) fn advance(&mut self, from: &Request, next: Option<String>) {
        self.pending = next.as_deref().and_then(|url| follow(from, url));
        self.current = self.current.advance(self.pending.as_ref().map(Request::full_url));
    }

    pub(crate) fn finish(&mut self) {
        self.pending = None;
        self.current = self.current.advance(None);
    }
}

/// Request for a `next` link; malformed links end the sequence
pub(crate) fn follow(from: &Request, url: &str) -> Option<Request> {
    match from.follow(url) {
        Ok(request) => Some(request),
        Err(e) => {
            tracing::warn!("Ignoring malformed next link {}: {}", url, e);
            None
        }
    }
}
