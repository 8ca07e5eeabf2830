//! Error types for metadata and monitoring operations.

use thiserror::Error;

/// Result type alias for Google Cloud operations.
pub type GcpResult<T> = Result<T, GcpError>;

/// Errors from the metadata server or the monitoring backend.
#[derive(Debug, Error)]
pub enum GcpError {
    #[error("failed to build http client: {0}")]
    BuildClient(#[source] reqwest::Error),

    #[error("metadata lookup '{path}' failed: {source}")]
    Metadata {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("metadata lookup '{path}' returned {code}")]
    MetadataStatus { path: String, code: u16 },

    #[error("token fetch failed: {0}")]
    Token(#[source] reqwest::Error),

    #[error("monitoring request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("monitoring backend rejected write ({code}): {body}")]
    Rejected { code: u16, body: String },
}
