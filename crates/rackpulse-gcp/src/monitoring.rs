//! Cloud Monitoring v3 REST client.
//!
//! Implements the single call the agent needs,
//! `projects.timeSeries.create`, authenticated with ambient
//! service-account tokens from the metadata server.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::{GcpError, GcpResult};
use crate::token::TokenProvider;

/// Public endpoint of the Cloud Monitoring API.
pub const DEFAULT_MONITORING_BASE: &str = "https://monitoring.googleapis.com";

// ── Wire types ─────────────────────────────────────────────────────
//
// The subset of the v3 surface a single-point gauge write touches.
// int64 fields cross the proto3 JSON boundary as strings.

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimeSeriesRequest {
    pub time_series: Vec<TimeSeries>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeSeries {
    pub metric: Metric,
    pub resource: MonitoredResource,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metric {
    #[serde(rename = "type")]
    pub metric_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitoredResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Point {
    pub interval: TimeInterval,
    pub value: TypedValue,
}

/// End-of-interval semantics: a gauge point carries no start time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInterval {
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedValue {
    pub int64_value: String,
}

// ── Client ─────────────────────────────────────────────────────────

/// Client for time-series writes.
#[derive(Debug)]
pub struct MonitoringClient {
    http: reqwest::Client,
    base: String,
    tokens: TokenProvider,
}

impl MonitoringClient {
    /// Build the client, sourcing credentials from `metadata_base`.
    ///
    /// Construction failure is fatal to the process; there is no point
    /// polling if writes can never be issued.
    pub fn new(
        metadata_base: impl Into<String>,
        monitoring_base: impl Into<String>,
    ) -> GcpResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(GcpError::BuildClient)?;
        let tokens = TokenProvider::new(http.clone(), metadata_base);
        Ok(Self {
            http,
            base: monitoring_base.into(),
            tokens,
        })
    }

    /// Submit one write, blocking the caller until the backend accepts
    /// or rejects it.
    pub async fn create_time_series(&self, project_id: &str, series: TimeSeries) -> GcpResult<()> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}/v3/projects/{}/timeSeries", self.base, project_id);
        let request = CreateTimeSeriesRequest {
            time_series: vec![series],
        };

        let resp = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(GcpError::Transport)?;

        let code = resp.status();
        if !code.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GcpError::Rejected {
                code: code.as_u16(),
                body,
            });
        }

        debug!(project_id, "time series accepted");
        Ok(())
    }
}
