//! Authentication module
//!
//! Supports: Token, X-Auth-Token, Bearer, Basic, API Key, Custom Headers
//!
//! The `Authenticator` rewrites outgoing requests; `AuthStage` in the
//! pipeline module applies it to every request a client sends.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, Location};

#[cfg(test)]
mod tests;
