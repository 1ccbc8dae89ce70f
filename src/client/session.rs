//! Client session

use super::builder::ClientBuilder;
use crate::config::ClientConfig;
use crate::decode::ResponseDecoder;
use crate::error::Result;
use crate::http::url::{resolve, split_query};
use crate::http::{Request, Response};
use crate::link::LinkFollower;
use crate::pagination::{BoundedPagePool, PageStream, PaginationConfig, SequentialPaginator};
use crate::pipeline::{Context, Pipeline};
use crate::types::{Method, QueryMap};
use futures::TryStreamExt;
use std::sync::Arc;

/// A configured HTTP session.
///
/// Cloning is cheap; clones share the pipeline, its cache and its rate
/// limiter.
#[derive(Clone)]
pub struct Client {
    pub(super) pipeline: Arc<Pipeline>,
    pub(super) base_url: Option<String>,
    pub(super) trailing_slash: bool,
    pub(super) follower: Arc<dyn LinkFollower>,
    pub(super) pagination: PaginationConfig,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Build a client from configuration, with in-memory cache backends
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        ClientBuilder::from_config(config)?.build()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn pagination(&self) -> &PaginationConfig {
        &self.pagination
    }

    /// Build a request for `url`.
    ///
    /// Relative URLs are joined to the base URL. A query string in the URL
    /// is moved into the parameter map, overriding `query` on conflicts.
    pub fn prepare(&self, method: Method, url: &str, query: QueryMap) -> Result<Request> {
        let resolved = resolve(self.base_url.as_deref(), url, self.trailing_slash)?;
        let (url, embedded) = split_query(&resolved)?;
        let mut request = Request::new(method, url);
        request.query = query;
        request.query.extend(embedded);
        Ok(request)
    }

    /// Run one request through the pipeline
    pub async fn send(&self, request: Request, context: Context) -> Result<Response> {
        let mut context = context;
        self.pipeline.execute(request, &mut context).await
    }

    /// GET `url` without extra parameters
    pub async fn get(&self, url: &str) -> Result<Response> {
        let request = self.prepare(Method::GET, url, QueryMap::new())?;
        self.send(request, Context::new()).await
    }

    /// Run one request and decode its response
    pub async fn fetch<T>(
        &self,
        request: Request,
        context: Context,
        decoder: &dyn ResponseDecoder<T>,
    ) -> Result<T> {
        let response = self.send(request, context).await?;
        decoder.decode(response)
    }

    /// Sequential paginator over this client's pipeline
    pub fn sequential<T: Send + 'static>(
        &self,
        decoder: Arc<dyn ResponseDecoder<T>>,
    ) -> SequentialPaginator<T> {
        SequentialPaginator::new(self.pipeline.clone(), self.follower.clone(), decoder)
            .max_pages(self.pagination.max_pages)
    }

    /// Concurrent paginator over this client's pipeline
    pub fn pool<T: Send + 'static>(&self, decoder: Arc<dyn ResponseDecoder<T>>) -> BoundedPagePool<T> {
        BoundedPagePool::new(self.pipeline.clone(), self.follower.clone(), decoder)
            .with_config(&self.pagination)
    }

    /// Pages starting at `request`, one request at a time
    pub fn paginate<T: Send + 'static>(
        &self,
        request: Request,
        context: Context,
        decoder: Arc<dyn ResponseDecoder<T>>,
    ) -> PageStream<T> {
        self.sequential(decoder).pages(request, context)
    }

    /// Pages starting at `request`, prefetched concurrently, in page order
    pub fn paginate_concurrent<T: Send + 'static>(
        &self,
        request: Request,
        context: Context,
        decoder: Arc<dyn ResponseDecoder<T>>,
    ) -> PageStream<T> {
        self.pool(decoder).pages(request, context)
    }

    /// Every page, in order; the first error aborts
    pub async fn collect_pages<T: Send + 'static>(
        &self,
        request: Request,
        context: Context,
        decoder: Arc<dyn ResponseDecoder<T>>,
    ) -> Result<Vec<T>> {
        self.paginate(request, context, decoder).try_collect().await
    }

    /// Every page via the concurrent pool, in order; the first error aborts
    pub async fn collect_pages_concurrent<T: Send + 'static>(
        &self,
        request: Request,
        context: Context,
        decoder: Arc<dyn ResponseDecoder<T>>,
    ) -> Result<Vec<T>> {
        self.paginate_concurrent(request, context, decoder)
            .try_collect()
            .await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("trailing_slash", &self.trailing_slash)
            .field("pipeline", &self.pipeline)
            .field("pagination", &self.pagination)
            .finish_non_exhaustive()
    }
}
