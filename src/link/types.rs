//! Link following types and traits

use crate::http::{Request, Response};

/// Position of one page in a sequence.
///
/// `url == None` means there is no further page. `index` is 1-based and only
/// used for ordering; it says nothing about the page's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    /// 1-based position in the sequence
    pub index: u32,
    /// Locator of this page, if there is one
    pub url: Option<String>,
}

impl PageDescriptor {
    /// Descriptor of the first page
    pub fn first(url: impl Into<String>) -> Self {
        Self {
            index: 1,
            url: Some(url.into()),
        }
    }

    /// Descriptor that follows this one
    pub fn advance(&self, url: Option<String>) -> Self {
        Self {
            index: self.index + 1,
            url,
        }
    }

    /// Whether this descriptor ends the sequence
    pub fn is_terminal(&self) -> bool {
        self.url.is_none()
    }
}

/// Extracts pagination metadata from responses
pub trait LinkFollower: Send + Sync {
    /// Locator of the page after `response`, or `None` when the sequence ends
    fn next_page(&self, response: &Response) -> Option<String>;

    /// Total page count, when the protocol advertises it.
    ///
    /// Only consulted on the first response of a concurrent run.
    fn total_pages(&self, _response: &Response) -> Option<u32> {
        None
    }

    /// Page number addressed by `first`, the request that starts a run
    fn start_index(&self, _first: &Request) -> u32 {
        1
    }

    /// Request for page `index` of a run that started with `first`.
    ///
    /// Returning `None` means pages cannot be addressed directly and must be
    /// discovered one link at a time.
    fn page_request(&self, _first: &Request, _index: u32) -> Option<Request> {
        None
    }
}
