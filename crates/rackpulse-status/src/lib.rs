//! rackpulse-status — server-status endpoint schema and fetcher.
//!
//! Issues the HTTP GET against the local server-status URL and decodes
//! the JSON body into a [`StatusSnapshot`]. Only the busy/idle worker
//! counters are consumed downstream; the per-connection records are
//! decoded for schema completeness and dropped.

pub mod error;
pub mod fetch;
pub mod schema;

pub use error::{StatusError, StatusResult};
pub use fetch::{StatusResponse, fetch_status};
pub use schema::{ConnectionRecord, StatusSnapshot};
