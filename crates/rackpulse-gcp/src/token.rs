//! Ambient service-account credentials.
//!
//! The metadata server hands out short-lived access tokens for the
//! instance's default service account; no key material is ever
//! configured. Tokens are cached and refreshed near expiry.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{GcpError, GcpResult};

/// Refresh when a cached token is this close to expiry.
const EXPIRY_SLACK: Duration = Duration::from_secs(60);

const TOKEN_PATH: &str = "instance/service-accounts/default/token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Caches the default service account's access token.
#[derive(Debug)]
pub struct TokenProvider {
    http: reqwest::Client,
    base: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Build a provider against the given metadata base URL.
    pub fn new(http: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            http,
            base: base.into(),
            cached: Mutex::new(None),
        }
    }

    /// Current access token, refreshed through the metadata server when
    /// the cached one is absent or near expiry.
    pub async fn access_token(&self) -> GcpResult<String> {
        let mut cached = self.cached.lock().await;

        if let Some(tok) = cached.as_ref() {
            if tok.expires_at.saturating_duration_since(Instant::now()) > EXPIRY_SLACK {
                return Ok(tok.access_token.clone());
            }
        }

        let url = format!("{}/{}", self.base, TOKEN_PATH);
        let resp = self
            .http
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(GcpError::Token)?;

        if !resp.status().is_success() {
            return Err(GcpError::MetadataStatus {
                path: TOKEN_PATH.to_string(),
                code: resp.status().as_u16(),
            });
        }

        let tok: TokenResponse = resp.json().await.map_err(GcpError::Token)?;
        debug!(expires_in = tok.expires_in, "service account token refreshed");

        let access = tok.access_token.clone();
        *cached = Some(CachedToken {
            access_token: tok.access_token,
            expires_at: Instant::now() + Duration::from_secs(tok.expires_in),
        });
        Ok(access)
    }
}
