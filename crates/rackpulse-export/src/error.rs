//! Error types for label resolution and metric publication.

use rackpulse_gcp::GcpError;
use thiserror::Error;

/// Result type alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors from resolving labels or publishing a write.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The legacy container model needs an explicit pod id.
    #[error("resource model 'container' requires a pod id")]
    MissingPodId,

    #[error("time series write failed: {0}")]
    Publish(#[source] GcpError),
}
