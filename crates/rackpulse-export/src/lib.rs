//! rackpulse-export — resource label profiles and the metric emitter.
//!
//! Turns (metric name, gauge value) pairs into single-point time-series
//! writes, tagged with the monitored-resource identity resolved once at
//! startup.

pub mod emitter;
pub mod error;
pub mod labels;

pub use emitter::{BUSY_WORKER_METRIC, CUSTOM_METRIC_PREFIX, IDLE_WORKER_METRIC, MetricEmitter};
pub use error::{ExportError, ExportResult};
pub use labels::{PodIdentity, ResourceLabels, ResourceModel};
