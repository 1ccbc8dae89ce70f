//! Scripted transports for unit tests

use crate::error::{Error, Result};
use crate::http::{Request, Response, Transport};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) const BASE: &str = "https://api.test/items";

/// Answers from a fixed queue and records every request it sees
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<Response>>>,
    seen: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, response: Response) -> Self {
        self.replies.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        let error = Error::transport(&Request::get(BASE), message);
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &Request) -> Result<Response> {
        self.seen.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::transport(request, "script exhausted")))
    }
}

/// A link-paginated backend: page `n` answers `{"page": n}` with `next` and
/// `last` relations, selected by the `page` query parameter.
pub(crate) struct PagedTransport {
    total: u32,
    with_last: bool,
    relative: bool,
    delay: Duration,
    slow: HashMap<u32, Duration>,
    failing: HashSet<u32>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl PagedTransport {
    pub fn new(total: u32) -> Self {
        Self {
            total,
            with_last: true,
            relative: false,
            delay: Duration::ZERO,
            slow: HashMap::new(),
            failing: HashSet::new(),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn without_last(mut self) -> Self {
        self.with_last = false;
        self
    }

    /// Emit `Link` targets as `/items?page=n` instead of absolute URLs
    pub fn relative_links(mut self) -> Self {
        self.relative = true;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn slow_page(mut self, page: u32, delay: Duration) -> Self {
        self.slow.insert(page, delay);
        self
    }

    pub fn failing_page(mut self, page: u32) -> Self {
        self.failing.insert(page);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn page_url(page: u32) -> String {
        format!("{BASE}?page={page}")
    }

    fn link(&self, page: u32) -> String {
        if self.relative {
            format!("/items?page={page}")
        } else {
            Self::page_url(page)
        }
    }

    fn respond(&self, page: u32) -> Response {
        let mut response = Response::new(200)
            .with_json(&json!({ "page": page }))
            .with_url(Self::page_url(page));
        if page < self.total {
            response = response.with_header(
                "link",
                &format!("<{}>; rel=\"next\"", self.link(page + 1)),
            );
        }
        if self.with_last {
            response = response.with_header(
                "link",
                &format!("<{}>; rel=\"last\"", self.link(self.total)),
            );
        }
        response
    }
}

#[async_trait]
impl Transport for PagedTransport {
    async fn send(&self, request: &Request) -> Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let page: u32 = request
            .query
            .get("page")
            .and_then(|p| p.parse().ok())
            .unwrap_or(1);
        let delay = self.slow.get(&page).copied().unwrap_or(self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.failing.contains(&page) {
            return Err(Error::transport(request, format!("page {page} unavailable")));
        }
        Ok(self.respond(page))
    }
}
