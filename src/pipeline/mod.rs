//! Pipeline module
//!
//! Explicit, ordered composition of cross-cutting behaviour around the
//! transport call.
//!
//! # Overview
//!
//! ```text
//!  execute(request)
//!        │
//!  ┌─────▼─────┐   request-shaping work runs outer → inner
//!  │  stage 0  │
//!  ├───────────┤
//!  │  stage 1  │   any stage may answer without calling inward
//!  ├───────────┤
//!  │    ...    │
//!  ├───────────┤
//!  │ Transport │
//!  └─────┬─────┘
//!        │         response-shaping work runs inner → outer
//!        ▼
//!    Response
//! ```
//!
//! Per-call data (cache key override, forced regeneration, page index)
//! travels in an explicit `Context` passed alongside the request.

mod chain;
mod stages;
mod types;

pub use chain::Pipeline;
pub use stages::{
    AuthStage, HeadersStage, QueryLogStage, RaiseForStatusStage, RateLimitStage, RetryPolicy,
    RetryStage,
};
pub use types::{Context, Next, Stage};
