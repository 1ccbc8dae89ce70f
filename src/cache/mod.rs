//! Cache module
//!
//! Two-level response cache with fallback to the last good value.
//!
//! # Overview
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!   request ─────►│ freshness marker present?    │── yes ──► value store ──► response
//!                 └──────────────┬───────────────┘           (hit)
//!                                │ no / forced regen / value evicted
//!                                ▼
//!                          inner pipeline
//!                     ┌──────────┴──────────┐
//!                  success             transport error
//!                     │                     │
//!          store value + marker     value store has entry?
//!                     │               yes ──► stale response (warn)
//!                     ▼               no  ──► error
//!                  response
//! ```
//!
//! Storage is injected through `CacheBackend`; `MemoryCache` is the
//! in-process implementation.

mod memory;
mod tiered;
mod types;

pub use memory::MemoryCache;
pub use tiered::TieredCache;
pub use types::{CacheBackend, CacheKey, CachePolicy, CachedResponse};
