//! The server-status JSON schema.
//!
//! The status page reports worker-pool occupancy plus one record per
//! in-flight connection. The upstream format is loosely typed, so the
//! per-connection fields that vary in shape are decoded as raw JSON
//! values; only the two worker counters are strictly typed.

use serde::Deserialize;
use serde_json::Value;

/// Decoded server-status response.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusSnapshot {
    /// Server uptime in seconds. Decoded but not consumed.
    #[serde(rename = "Uptime", default)]
    pub uptime: i64,

    /// Workers currently handling a request.
    #[serde(rename = "BusyWorkers")]
    pub busy_workers: i64,

    /// Workers waiting for work.
    #[serde(rename = "IdleWorkers")]
    pub idle_workers: i64,

    /// One record per in-flight connection.
    #[serde(default)]
    pub stats: Vec<ConnectionRecord>,
}

/// A single in-flight connection as reported by the status page.
///
/// `remote_addr`, `method`, `uri` and `protocol` accept any JSON shape.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionRecord {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub remote_addr: Value,
    #[serde(default)]
    pub method: Value,
    #[serde(default)]
    pub uri: Value,
    #[serde(default)]
    pub protocol: Value,
    #[serde(default)]
    pub pid: i64,
    #[serde(default)]
    pub status: String,
    /// Seconds since the request started.
    #[serde(default)]
    pub ss: i64,
}

impl StatusSnapshot {
    /// Decode a raw response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}
