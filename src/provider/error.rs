//! Provider error taxonomy.
//!
//! ```text
//! ConfigError       startup only, fatal           (config::loader)
//! ConnectionError   endpoint / client creation    → Backoff
//! EnumerationError  listing on a live client      → Backoff
//! DecodeError       one instance's labels         → instance skipped
//! ```

use thiserror::Error;

pub use crate::config::ConfigError;
pub use crate::label::DecodeError;

/// A failed exchange with the LXD API.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("invalid request: {0}")]
    Request(#[from] hyper::http::Error),

    #[error("failed to read response body: {0}")]
    Body(#[from] axum::Error),

    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LXD API error {code}: {message}")]
    Api { code: u16, message: String },

    #[error("request timed out after {0} seconds")]
    Timeout(u64),
}

/// The client could not be created.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("error parsing endpoint url {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported endpoint type {0}")]
    UnsupportedScheme(String),

    #[error("endpoint {0:?} names no socket path")]
    MissingSocketPath(String),

    #[error("cannot reach LXD server: {0}")]
    Transport(#[from] TransportError),
}

/// An established client failed to list instances.
#[derive(Debug, Error)]
#[error("failed to list instances: {0}")]
pub struct EnumerationError(#[from] pub TransportError);

/// Any failure that sends the supervisor into backoff.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Enumeration(#[from] EnumerationError),
}
