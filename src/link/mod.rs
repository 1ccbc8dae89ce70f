//! Link module
//!
//! Decides where a paginated sequence continues, from response metadata.
//!
//! # Overview
//!
//! A `LinkFollower` inspects a response and reports the next page locator
//! (and, when the protocol advertises one, the total page count). The
//! built-in `Rfc5988Follower` reads the `Link` header:
//!
//! ```text
//! Link: <https://api.example.com/items?page=2>; rel="next",
//!       <https://api.example.com/items?page=20>; rel="last"
//! ```
//!
//! Following is best-effort: a malformed or missing link means "no next
//! page", never an error.

mod follower;
mod types;

pub use follower::{parse_link_header, Rfc5988Follower};
pub use types::{LinkFollower, PageDescriptor};
