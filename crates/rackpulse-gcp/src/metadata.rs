//! GCE metadata-server client.
//!
//! Reads the handful of instance-metadata values the agent needs to
//! label its writes. Every value is whitespace-trimmed; the metadata
//! server pads some attributes with trailing newlines.

use tracing::debug;

use crate::error::{GcpError, GcpResult};

/// The metadata server as seen from inside a GCE instance.
pub const DEFAULT_METADATA_BASE: &str = "http://metadata.google.internal/computeMetadata/v1";

/// Client for the GCE metadata server.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    http: reqwest::Client,
    base: String,
}

impl MetadataClient {
    /// Build a client against the given metadata base URL.
    pub fn new(base: impl Into<String>) -> GcpResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(GcpError::BuildClient)?;
        Ok(Self {
            http,
            base: base.into(),
        })
    }

    async fn get(&self, path: &str) -> GcpResult<String> {
        let url = format!("{}/{}", self.base, path);
        let resp = self
            .http
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| GcpError::Metadata {
                path: path.to_string(),
                source: e,
            })?;

        if !resp.status().is_success() {
            return Err(GcpError::MetadataStatus {
                path: path.to_string(),
                code: resp.status().as_u16(),
            });
        }

        let text = resp.text().await.map_err(|e| GcpError::Metadata {
            path: path.to_string(),
            source: e,
        })?;
        let value = text.trim().to_string();
        debug!(path, %value, "metadata value read");
        Ok(value)
    }

    /// The project id (e.g. `my-project`).
    pub async fn project_id(&self) -> GcpResult<String> {
        self.get("project/project-id").await
    }

    /// Instance zone, reduced to its short name.
    ///
    /// The metadata server reports `projects/<num>/zones/<zone>`; only
    /// the final path segment is kept.
    pub async fn zone(&self) -> GcpResult<String> {
        let full = self.get("instance/zone").await?;
        Ok(full.rsplit('/').next().unwrap_or(&full).to_string())
    }

    /// A custom instance attribute (e.g. `cluster-name`).
    pub async fn instance_attribute(&self, name: &str) -> GcpResult<String> {
        self.get(&format!("instance/attributes/{name}")).await
    }
}
