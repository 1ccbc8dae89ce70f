//! Pipeline types and traits

use crate::error::Result;
use crate::http::{Request, Response, Transport};
use async_trait::async_trait;
use std::sync::Arc;

/// Per-call values threaded through every stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// Explicit cache key, overriding the one derived from the request
    pub cache_key: Option<String>,
    /// Skip the freshness check and always fetch
    pub force_cache_regen: bool,
    /// Position of the request in a paginated run, if any
    pub page: Option<u32>,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the cache key
    #[must_use]
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Bypass the freshness marker for this call
    #[must_use]
    pub fn force_regen(mut self) -> Self {
        self.force_cache_regen = true;
        self
    }

    /// Tag the call with its page index
    #[must_use]
    pub fn for_page(&self, index: u32) -> Self {
        Self {
            page: Some(index),
            ..self.clone()
        }
    }
}

/// A composable unit wrapping the transport call
#[async_trait]
pub trait Stage: Send + Sync {
    /// Short name used in logs and debug output
    fn name(&self) -> &'static str;

    /// Handle `request`, calling `next.run` to continue inward
    async fn process(&self, request: Request, ctx: &mut Context, next: Next<'_>)
        -> Result<Response>;
}

/// The remainder of the pipeline below the current stage
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stages: &'a [Arc<dyn Stage>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    pub(crate) fn new(stages: &'a [Arc<dyn Stage>], transport: &'a dyn Transport) -> Self {
        Self { stages, transport }
    }

    /// Run the remaining stages and the transport.
    ///
    /// `Next` is `Copy`, so a stage may call this more than once (retries).
    pub async fn run(self, request: Request, ctx: &mut Context) -> Result<Response> {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                stage
                    .process(request, ctx, Next::new(rest, self.transport))
                    .await
            }
            None => self.transport.send(&request).await,
        }
    }
}
