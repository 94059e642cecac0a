//! HTTP client for the Vigil API.

use anyhow::{Context, Result};
use serde::Deserialize;
use shared::models::Snapshot;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Liveness document returned by `/health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    /// "healthy" when the server responds.
    pub status: String,
    /// Service identifier.
    pub service: String,
    /// Server version.
    pub version: String,
    /// Server timestamp (RFC 3339).
    pub timestamp: String,
}

/// Thin wrapper over `reqwest` bound to one API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for `base_url` (trailing slashes are ignored).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches `/health`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or a malformed body.
    pub async fn health(&self) -> Result<HealthStatus> {
        self.get_json("/health").await
    }

    /// Fetches `/api/data`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or a malformed body.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        self.get_json("/api/data").await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        self.http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("Unexpected status from {url}"))?
            .json::<T>()
            .await
            .with_context(|| format!("Malformed response from {url}"))
    }
}
