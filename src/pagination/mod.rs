//! Pagination module
//!
//! Supports: sequential link following, bounded concurrent prefetch
//!
//! # Overview
//!
//! Both paginators turn a first request into a lazy `PageStream` of decoded
//! pages, in page order. `SequentialPaginator` issues one request per pull.
//! `BoundedPagePool` learns the page count from the first response and
//! fetches the rest with up to N requests in flight:
//!
//! ```text
//!  driver task                      workers (≤ N permits)
//!  ───────────                      ─────────────────────
//!  fetch page 1 ──► publish 1
//!  for i in 2..=total:
//!    acquire permit ──────────────► spawn: pipeline → release → decode
//!    publish finished head pages
//!  publish remaining in order
//!        │
//!        ▼
//!  bounded channel (capacity N) ──► consumer stream
//! ```
//!
//! Pages are published by the driver in request order, never completion
//! order. The first error ends the stream at its position.

mod pool;
mod sequential;
mod types;

pub use pool::BoundedPagePool;
pub use sequential::SequentialPaginator;
pub use types::{default_concurrency, PageStream, PaginationConfig, PaginationState};
