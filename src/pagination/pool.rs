//! Bounded, ordered concurrent prefetch

use super::types::{default_concurrency, follow, PageStream, PaginationConfig};
use crate::decode::ResponseDecoder;
use crate::error::{Error, Result};
use crate::http::Request;
use crate::link::LinkFollower;
use crate::pipeline::{Context, Pipeline};
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

/// Fetches pages with up to `concurrency` requests in flight and delivers
/// them in page order.
///
/// The run continues from the page the starting request addresses, so a
/// request for page 3 yields pages 3, 4, ... exactly as the sequential
/// paginator would. The page count comes from the first response. When the
/// follower cannot
/// report one, pages are discovered by following `next` links one at a
/// time, up to `discovery_limit`.
///
/// Each call to `pages` owns its own permits and channel, so concurrent runs
/// never compete for permits. `pages` must be called inside a Tokio runtime.
pub struct BoundedPagePool<T> {
    pipeline: Arc<Pipeline>,
    follower: Arc<dyn LinkFollower>,
    decoder: Arc<dyn ResponseDecoder<T>>,
    concurrency: usize,
    max_pages: u32,
    discovery_limit: u32,
}

impl<T> Clone for BoundedPagePool<T> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            follower: self.follower.clone(),
            decoder: self.decoder.clone(),
            concurrency: self.concurrency,
            max_pages: self.max_pages,
            discovery_limit: self.discovery_limit,
        }
    }
}

impl<T: Send + 'static> BoundedPagePool<T> {
    /// Pool sized to the available processing units
    pub fn new(
        pipeline: Arc<Pipeline>,
        follower: Arc<dyn LinkFollower>,
        decoder: Arc<dyn ResponseDecoder<T>>,
    ) -> Self {
        Self {
            pipeline,
            follower,
            decoder,
            concurrency: default_concurrency(),
            max_pages: 0,
            discovery_limit: PaginationConfig::default().discovery_limit,
        }
    }

    /// Requests in flight at once (at least 1)
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Stop after `max_pages` pages (0 = unlimited)
    #[must_use]
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Cap on pages found through `next` links
    #[must_use]
    pub fn discovery_limit(mut self, limit: u32) -> Self {
        self.discovery_limit = limit;
        self
    }

    /// Apply concurrency and page caps from `config`
    #[must_use]
    pub fn with_config(self, config: &PaginationConfig) -> Self {
        self.concurrency(config.concurrency)
            .max_pages(config.max_pages)
            .discovery_limit(config.discovery_limit)
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency
    }

    /// Start a run at `request` and return its ordered page stream.
    ///
    /// Dropping the stream stops scheduling; requests already in flight
    /// finish in the background and their results are discarded.
    pub fn pages(&self, request: Request, context: Context) -> PageStream<T> {
        let (tx, rx) = mpsc::channel(self.concurrency);
        let driver = Driver {
            pool: self.clone(),
            tx,
        };
        tokio::spawn(driver.run(request, context));

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            let item = rx.recv().await?;
            Some((item, rx))
        });
        Box::pin(stream.fuse())
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Schedules workers and publishes their pages in order
struct Driver<T> {
    pool: BoundedPagePool<T>,
    tx: mpsc::Sender<Result<T>>,
}

impl<T: Send + 'static> Driver<T> {
    async fn run(self, first: Request, context: Context) {
        let mut ctx = context.for_page(1);
        let response = match self.pool.pipeline.execute(first.clone(), &mut ctx).await {
            Ok(response) => response,
            Err(e) => {
                self.publish(Err(e)).await;
                return;
            }
        };

        let total = self.pool.follower.total_pages(&response);
        let next = self.pool.follower.next_page(&response);
        if !self.publish(self.pool.decoder.decode(response)).await {
            return;
        }

        let cap = PaginationConfig::page_cap(self.pool.max_pages);
        let start = self.pool.follower.start_index(&first);
        let addressable = self
            .pool
            .follower
            .page_request(&first, start.saturating_add(1))
            .is_some();
        match total {
            Some(total) if addressable => {
                // `max_pages` counts pages fetched, starting with `start`
                let last = total.min(start.saturating_add(cap - 1));
                debug!(
                    "Fetching pages {}..={}, {} at a time",
                    start, last, self.pool.concurrency
                );
                self.fan_out(&first, &context, start, last).await;
            }
            _ if next.is_some() => {
                warn!(
                    "No page count for {}; following next links one at a time",
                    first.url
                );
                self.discover(first, &context, next, cap).await;
            }
            _ => {}
        }
    }

    /// Fetch pages `start+1..=last` concurrently, publishing in index order
    async fn fan_out(&self, first: &Request, context: &Context, start: u32, last: u32) {
        let permits = Arc::new(Semaphore::new(self.pool.concurrency));
        let window = self.pool.concurrency * 2;
        let mut pending: VecDeque<(u32, JoinHandle<Result<T>>)> = VecDeque::new();

        for index in start.saturating_add(1)..=last {
            if self.tx.is_closed() {
                debug!("Page stream dropped; not scheduling page {}", index);
                return;
            }

            // Keep the reorder buffer bounded while an early page is slow
            while pending.len() >= window {
                if !self.publish_head(&mut pending).await {
                    return;
                }
            }

            let permit = loop {
                let Some((_, head)) = pending.front_mut() else {
                    break permits.clone().acquire_owned().await;
                };
                let joined = tokio::select! {
                    biased;
                    permit = permits.clone().acquire_owned() => break permit,
                    joined = head => joined,
                };
                pending.pop_front();
                if !self.publish(flatten(joined)).await {
                    return;
                }
            };
            let Ok(permit) = permit else {
                return;
            };

            let Some(request) = self.pool.follower.page_request(first, index) else {
                self.publish(Err(Error::protocol(format!(
                    "Page {index} cannot be addressed"
                ))))
                .await;
                return;
            };

            let pipeline = self.pool.pipeline.clone();
            let decoder = self.pool.decoder.clone();
            let mut ctx = context.for_page(index - start + 1);
            let handle = tokio::spawn(async move {
                let response = pipeline.execute(request, &mut ctx).await;
                drop(permit);
                decoder.decode(response?)
            });
            pending.push_back((index, handle));
        }

        while !pending.is_empty() {
            if !self.publish_head(&mut pending).await {
                return;
            }
        }
    }

    /// Follow `next` links in order, one request at a time
    async fn discover(&self, first: Request, context: &Context, next: Option<String>, cap: u32) {
        let mut request = first;
        let mut next = next;
        let mut index = 1;

        while let Some(url) = next.take() {
            if index >= cap {
                debug!("Reached page cap of {}", cap);
                return;
            }
            if index >= self.pool.discovery_limit {
                warn!(
                    "Stopping link discovery after {} pages",
                    self.pool.discovery_limit
                );
                return;
            }
            if self.tx.is_closed() {
                return;
            }
            let Some(following) = follow(&request, &url) else {
                return;
            };
            request = following;
            index += 1;

            let mut ctx = context.for_page(index);
            let response = match self.pool.pipeline.execute(request.clone(), &mut ctx).await {
                Ok(response) => response,
                Err(e) => {
                    self.publish(Err(e)).await;
                    return;
                }
            };
            next = self.pool.follower.next_page(&response);
            if !self.publish(self.pool.decoder.decode(response)).await {
                return;
            }
        }
    }

    async fn publish_head(&self, pending: &mut VecDeque<(u32, JoinHandle<Result<T>>)>) -> bool {
        match pending.pop_front() {
            Some((_, handle)) => self.publish(flatten(handle.await)).await,
            None => true,
        }
    }

    /// Send one page. Returns `false` when the run must stop: the page was
    /// an error or the consumer is gone.
    async fn publish(&self, page: Result<T>) -> bool {
        let ok = page.is_ok();
        if self.tx.send(page).await.is_err() {
            debug!("Page stream dropped; stopping");
            return false;
        }
        ok
    }
}

fn flatten<T>(joined: std::result::Result<Result<T>, JoinError>) -> Result<T> {
    joined.unwrap_or_else(|e| Err(Error::Other(format!("Page worker failed: {e}"))))
}
