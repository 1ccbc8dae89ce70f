//! One-request-at-a-time link following

use super::types::{PageStream, PaginationConfig, PaginationState};
use crate::decode::ResponseDecoder;
use crate::error::Result;
use crate::http::Request;
use crate::link::LinkFollower;
use crate::pipeline::{Context, Pipeline};
use futures::StreamExt;
use std::sync::Arc;
use tracing::debug;

/// Follows `next` links, fetching one page per pull.
///
/// Each stream is single-pass: once it ends (exhausted, capped or after an
/// error) it yields nothing more. Call `pages` again for a new run.
pub struct SequentialPaginator<T> {
    pipeline: Arc<Pipeline>,
    follower: Arc<dyn LinkFollower>,
    decoder: Arc<dyn ResponseDecoder<T>>,
    max_pages: u32,
}

impl<T> Clone for SequentialPaginator<T> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            follower: self.follower.clone(),
            decoder: self.decoder.clone(),
            max_pages: self.max_pages,
        }
    }
}

impl<T: Send + 'static> SequentialPaginator<T> {
    pub fn new(
        pipeline: Arc<Pipeline>,
        follower: Arc<dyn LinkFollower>,
        decoder: Arc<dyn ResponseDecoder<T>>,
    ) -> Self {
        Self {
            pipeline,
            follower,
            decoder,
            max_pages: 0,
        }
    }

    /// Stop after `max_pages` pages (0 = unlimited)
    #[must_use]
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Lazily fetch every page starting at `request`
    pub fn pages(&self, request: Request, context: Context) -> PageStream<T> {
        let state = PaginationState::new(request, context);
        let stream = futures::stream::unfold((self.clone(), state), |(this, mut state)| async move {
            let item = this.step(&mut state).await?;
            Some((item, (this, state)))
        });
        Box::pin(stream.fuse())
    }

    async fn step(&self, state: &mut PaginationState) -> Option<Result<T>> {
        if state.current.index > PaginationConfig::page_cap(self.max_pages) {
            debug!("Stopping after {} pages", self.max_pages);
            state.finish();
            return None;
        }
        let request = state.pending.take()?;

        let mut ctx = state.context.for_page(state.current.index);
        let response = match self.pipeline.execute(request.clone(), &mut ctx).await {
            Ok(response) => response,
            Err(e) => {
                state.finish();
                return Some(Err(e));
            }
        };

        state.advance(&request, self.follower.next_page(&response));
        let page = self.decoder.decode(response);
        if page.is_err() {
            state.finish();
        }
        Some(page)
    }
}
