//! Error types for pagewise
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use crate::http::{Request, Response};
use thiserror::Error;

/// The main error type for pagewise
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed for {} {}: {source}", .request.method, .request.url)]
    Http {
        request: Box<Request>,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {} for {} {}", .response.status, .request.method, .request.url)]
    HttpStatus {
        request: Box<Request>,
        response: Box<Response>,
    },

    #[error("Request timeout after {timeout_ms}ms for {} {}", .request.method, .request.url)]
    Timeout {
        request: Box<Request>,
        timeout_ms: u64,
    },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited {
        request: Box<Request>,
        retry_after_seconds: u64,
    },

    #[error("Transport failed for {} {}: {message}", .request.method, .request.url)]
    Transport {
        request: Box<Request>,
        message: String,
    },

    // ============================================================================
    // Pagination Errors
    // ============================================================================
    #[error("Pagination protocol error: {message}")]
    Protocol { message: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required collaborator: {name}")]
    MissingCollaborator { name: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing collaborator error
    pub fn missing_collaborator(name: impl Into<String>) -> Self {
        Self::MissingCollaborator { name: name.into() }
    }

    /// Create a pagination protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a generic transport error for `request`
    pub fn transport(request: &Request, message: impl Into<String>) -> Self {
        Self::Transport {
            request: Box::new(request.clone()),
            message: message.into(),
        }
    }

    /// Create an HTTP status error from the request and the offending response
    pub fn http_status(request: &Request, response: Response) -> Self {
        Self::HttpStatus {
            request: Box::new(request.clone()),
            response: Box::new(response),
        }
    }

    /// Whether this error came from the transport (network, IO, non-2xx status)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Http { .. }
                | Error::HttpStatus { .. }
                | Error::Timeout { .. }
                | Error::RateLimited { .. }
                | Error::Transport { .. }
        )
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http { source, .. } => source.is_connect() || source.is_timeout(),
            Error::RateLimited { .. } | Error::Timeout { .. } | Error::Transport { .. } => true,
            Error::HttpStatus { response, .. } => is_retryable_status(response.status),
            _ => false,
        }
    }

    /// The request that caused a transport error
    pub fn request(&self) -> Option<&Request> {
        match self {
            Error::Http { request, .. }
            | Error::HttpStatus { request, .. }
            | Error::Timeout { request, .. }
            | Error::RateLimited { request, .. }
            | Error::Transport { request, .. } => Some(request),
            _ => None,
        }
    }

    /// The response attached to a transport error, if the server answered
    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::HttpStatus { response, .. } => Some(response),
            _ => None,
        }
    }

    /// HTTP status code of the failed response, if any
    pub fn status(&self) -> Option<u16> {
        self.response().map(|r| r.status)
    }
}

/// Check if an HTTP status code is retryable
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(
        status,
        429 | 500 | 502 | 503 | 504 | 520 | 521 | 522 | 523 | 524
    )
}

/// Result type alias for pagewise
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
