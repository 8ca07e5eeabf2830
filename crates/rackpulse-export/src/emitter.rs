//! Metric emitter — one gauge value becomes one time-series write.

use chrono::{SecondsFormat, Utc};
use rackpulse_gcp::MonitoringClient;
use rackpulse_gcp::monitoring::{
    Metric, MonitoredResource, Point, TimeInterval, TimeSeries, TypedValue,
};
use tracing::debug;

use crate::error::{ExportError, ExportResult};
use crate::labels::ResourceLabels;

/// Custom metric types are namespaced under this prefix.
pub const CUSTOM_METRIC_PREFIX: &str = "custom.googleapis.com";

/// Short name of the busy-worker gauge.
pub const BUSY_WORKER_METRIC: &str = "busy-worker-num";

/// Short name of the idle-worker gauge.
pub const IDLE_WORKER_METRIC: &str = "idle-worker-num";

/// Publishes gauge values against a fixed resource identity.
#[derive(Debug)]
pub struct MetricEmitter {
    client: MonitoringClient,
}

impl MetricEmitter {
    pub fn new(client: MonitoringClient) -> Self {
        Self { client }
    }

    /// Submit one data point for `name`, stamped with the current wall
    /// clock. Exactly one write per call; the caller decides what a
    /// failure means for the rest of its cycle.
    pub async fn emit(&self, name: &str, value: i64, labels: &ResourceLabels) -> ExportResult<()> {
        let end_time = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let series = build_series(name, value, labels, end_time);

        self.client
            .create_time_series(labels.project_id(), series)
            .await
            .map_err(ExportError::Publish)?;

        debug!(metric = name, value, "gauge published");
        Ok(())
    }
}

/// Assemble a single-point series for a gauge write.
fn build_series(name: &str, value: i64, labels: &ResourceLabels, end_time: String) -> TimeSeries {
    TimeSeries {
        metric: Metric {
            metric_type: format!("{CUSTOM_METRIC_PREFIX}/{name}"),
        },
        resource: MonitoredResource {
            resource_type: labels.resource_type().to_string(),
            labels: labels.labels().clone(),
        },
        points: vec![Point {
            interval: TimeInterval { end_time },
            value: TypedValue {
                int64_value: value.to_string(),
            },
        }],
    }
}
