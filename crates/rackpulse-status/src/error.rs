//! Error types for status fetching and decoding.

use thiserror::Error;

/// Result type alias for status operations.
pub type StatusResult<T> = Result<T, StatusError>;

/// Errors from fetching or decoding the server-status endpoint.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("invalid status url: {0}")]
    Url(String),

    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    #[error("request failed: {0}")]
    Request(#[source] hyper::Error),

    #[error("body read failed: {0}")]
    Body(#[source] hyper::Error),

    #[error("status endpoint returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("malformed status body: {0}")]
    Decode(#[from] serde_json::Error),
}
