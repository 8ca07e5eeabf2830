//! HTTP fetch of the server-status endpoint.
//!
//! One GET over a fresh HTTP/1.1 connection per call: connect,
//! handshake, drive the connection in the background, send the request,
//! collect the body. No timeout beyond the transport's own, no retries
//! within the call — the poll loop simply tries again next cycle.

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::Uri;
use tracing::debug;

use crate::error::{StatusError, StatusResult};
use crate::schema::StatusSnapshot;

/// Raw result of one fetch: HTTP status code plus collected body bytes.
#[derive(Debug)]
pub struct StatusResponse {
    pub code: u16,
    pub body: Bytes,
}

impl StatusResponse {
    /// Decode the body into a snapshot, treating any non-200 status as
    /// a failed cycle first.
    pub fn into_snapshot(self) -> StatusResult<StatusSnapshot> {
        if self.code != 200 {
            return Err(StatusError::Status {
                code: self.code,
                body: String::from_utf8_lossy(&self.body).into_owned(),
            });
        }
        Ok(StatusSnapshot::from_slice(&self.body)?)
    }
}

/// Fetch the status endpoint once.
///
/// Returns the raw status code and body without interpreting either.
pub async fn fetch_status(url: &str) -> StatusResult<StatusResponse> {
    let uri: Uri = url.parse().map_err(|e: http::uri::InvalidUri| StatusError::Url(e.to_string()))?;
    let host = uri
        .host()
        .ok_or_else(|| StatusError::Url(format!("no host in '{url}'")))?;
    let port = uri.port_u16().unwrap_or(80);
    let address = format!("{host}:{port}");

    let stream = tokio::net::TcpStream::connect(&address)
        .await
        .map_err(StatusError::Connect)?;

    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(StatusError::Request)?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let req = http::Request::builder()
        .method("GET")
        .uri(url)
        .header("host", &address)
        .header("user-agent", "rackpulse/0.1")
        .body(Empty::<Bytes>::new())
        .map_err(|e| StatusError::Url(e.to_string()))?;

    let resp = sender
        .send_request(req)
        .await
        .map_err(StatusError::Request)?;
    let code = resp.status().as_u16();
    let body = resp
        .into_body()
        .collect()
        .await
        .map_err(StatusError::Body)?
        .to_bytes();

    debug!(code, bytes = body.len(), %url, "status endpoint fetched");
    Ok(StatusResponse { code, body })
}
