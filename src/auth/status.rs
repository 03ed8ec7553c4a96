// src/auth/status.rs

//! Activation status lookups against the auth service.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};

/// Path of the status endpoint, relative to the auth service URL.
pub const STATUS_PATH: &str = "/api/get-api-key-status";

/// Source of the raw activation status for an org id.
///
/// Production code uses [`HttpStatusClient`]; tests script the responses.
pub trait ActivationStatusSource: Send + Sync {
    /// Return the raw response body (e.g. `"activated"`).
    fn fetch_status<'a>(
        &'a self,
        org_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}

/// Queries `GET <base_url>/api/get-api-key-status?orgId=<id>`.
#[derive(Debug, Clone)]
pub struct HttpStatusClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpStatusClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub fn status_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), STATUS_PATH)
    }
}

impl ActivationStatusSource for HttpStatusClient {
    fn fetch_status<'a>(
        &'a self,
        org_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let body = self
                .client
                .get(self.status_url())
                .query(&[("orgId", org_id)])
                .send()
                .await
                .context("requesting activation status")?
                .error_for_status()
                .context("activation status endpoint returned an error")?
                .text()
                .await
                .context("reading activation status body")?;
            Ok(body)
        })
    }
}
