//! Authenticator implementation
//!
//! Applies credentials to outgoing requests.

use super::types::{AuthConfig, Location};
use crate::http::Request;
use base64::Engine as _;

/// Authenticator handles applying authentication to requests
#[derive(Debug, Clone)]
pub struct Authenticator {
    config: AuthConfig,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// The configuration this authenticator applies
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Return `request` with credentials added
    pub fn apply(&self, request: Request) -> Request {
        match &self.config {
            AuthConfig::None => request,

            AuthConfig::Token { token } => {
                request.with_header("Authorization", format!("Token {token}"))
            }

            AuthConfig::XToken { token } => request.with_header("X-Auth-Token", token.clone()),

            AuthConfig::Bearer { token } => {
                request.with_header("Authorization", format!("Bearer {token}"))
            }

            AuthConfig::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                request.with_header("Authorization", format!("Basic {encoded}"))
            }

            AuthConfig::ApiKey {
                location,
                header_name,
                query_param,
                prefix,
                value,
            } => {
                let val = format!("{}{}", prefix.as_deref().unwrap_or(""), value);
                match location {
                    Location::Header => {
                        let header = header_name.as_deref().unwrap_or("Authorization");
                        request.with_header(header, val)
                    }
                    Location::Query => {
                        let param = query_param.as_deref().unwrap_or("api_key");
                        request.with_query(param, val)
                    }
                }
            }

            AuthConfig::CustomHeaders { headers } => {
                let mut request = request;
                for (key, value) in headers {
                    request = request.with_header(key.clone(), value.clone());
                }
                request
            }
        }
    }
}
