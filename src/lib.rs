//! # pagewise
//!
//! An HTTP client for paginated APIs. Responses are followed through
//! RFC 5988 `Link` headers, either one page at a time or through a bounded
//! pool of concurrent requests that still yields pages in order.
//!
//! ## Features
//!
//! - **Link pagination**: `next`/`last` relations, page-number addressing
//! - **Concurrent prefetch**: bounded in-flight requests, ordered results
//! - **Request pipeline**: composable stages for auth, headers, retries,
//!   rate limiting and status checks
//! - **Tiered caching**: fresh/stale markers over a long-lived value store,
//!   with fallback to the stored value when the server fails
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pagewise::{Client, Context, JsonDecoder, Method, QueryMap, Result};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::builder()
//!         .base_url("https://api.github.com")
//!         .concurrency(4)
//!         .build()?;
//!
//!     let request = client.prepare(Method::GET, "/repos/rust-lang/rust/issues", QueryMap::new())?;
//!     let pages = client
//!         .collect_pages_concurrent(request, Context::new(), Arc::new(JsonDecoder::new()))
//!         .await?;
//!     println!("{} pages", pages.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                          Client                            │
//! │   prepare() → Request    fetch()    paginate[_concurrent]()│
//! └────────────────────────────────────────────────────────────┘
//!            │                                  │
//! ┌──────────┴───────────┐         ┌────────────┴─────────────┐
//! │       Pipeline       │ ◄────── │ SequentialPaginator      │
//! │ query_log → cache →  │         │ BoundedPagePool          │
//! │ retry → raise → ...  │         │   (LinkFollower, decoder)│
//! │ auth → rate → headers│         └──────────────────────────┘
//! └──────────┬───────────┘
//!            │
//!       Transport (reqwest)
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication
pub mod auth;

/// Request/response values, transport and rate limiting
pub mod http;

/// Link header parsing and page addressing
pub mod link;

/// Request pipeline and built-in stages
pub mod pipeline;

/// Tiered response cache
pub mod cache;

/// Response decoders
pub mod decode;

/// Sequential and concurrent pagination
pub mod pagination;

/// Client configuration
pub mod config;

/// Client session and builder
pub mod client;

/// Command-line interface
pub mod cli;

#[cfg(test)]
pub(crate) mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use auth::{AuthConfig, Authenticator};
pub use cache::{CacheBackend, CacheKey, CachePolicy, MemoryCache, TieredCache};
pub use client::{Client, ClientBuilder};
pub use config::{CacheConfig, ClientConfig};
pub use decode::{DecoderFormat, JsonDecoder, Payload, ResponseDecoder};
pub use http::{Request, Response, Transport};
pub use link::{LinkFollower, PageDescriptor, Rfc5988Follower};
pub use pagination::{BoundedPagePool, PageStream, PaginationConfig, SequentialPaginator};
pub use pipeline::{Context, Next, Pipeline, Stage};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
