//! rackpulse-gcp — Google Cloud plumbing for the agent.
//!
//! Talks to the GCE metadata server (project identity, instance
//! attributes, ambient service-account tokens) and to the Cloud
//! Monitoring v3 REST API. Base URLs are injectable so tests can stand
//! in local servers for both.

pub mod error;
pub mod metadata;
pub mod monitoring;
pub mod token;

pub use error::{GcpError, GcpResult};
pub use metadata::{DEFAULT_METADATA_BASE, MetadataClient};
pub use monitoring::{DEFAULT_MONITORING_BASE, MonitoringClient, TimeSeries};
pub use token::TokenProvider;
