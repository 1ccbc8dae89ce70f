//! HTTP module
//!
//! Request/response values, URL preparation and the transport collaborator.
//!
//! # Features
//!
//! - **Plain-data messages**: `Request` and `Response` carry no connection state
//! - **URL preparation**: base URL joining and query-string normalisation
//! - **Pluggable transport**: `Transport` trait with a reqwest implementation
//! - **Rate Limiting**: Token bucket rate limiter using governor

mod rate_limit;
mod transport;
mod types;
pub mod url;

pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use transport::{ReqwestTransport, Transport, TransportConfig};
pub use types::{Request, Response};

#[cfg(test)]
mod tests;
