//! Client module
//!
//! A session facade: URL preparation, the configured pipeline, and the two
//! paginators over it.
//!
//! # Overview
//!
//! `ClientBuilder` installs stages outermost first:
//!
//! ```text
//! QueryLogStage → TieredCache → RetryStage → RaiseForStatusStage
//!   → custom stages → AuthStage → RateLimitStage → HeadersStage → Transport
//! ```
//!
//! The cache sits outside status raising, so a 5xx counts as a failed fetch
//! and can be answered from the last good value.

mod builder;
mod session;

pub use builder::ClientBuilder;
pub use session::Client;
