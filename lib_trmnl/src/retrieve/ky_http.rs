//! # HTTP Retrieval Utilities
//!
//! A JSON GET client around `reqwest` with retry middleware. Used to pull
//! JSON objects from the configured `apiEndpoints`.

use std::time::Duration;

use anyhow::Context;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use url::Url;

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Retries for transient failures (connect errors, 5xx, 429).
pub const MAX_RETRIES: u32 = 3;

/// # Api Client
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: ClientWithMiddleware,
}

impl ApiClient {
    /// Builds a client with the default timeout and retry policy.
    pub fn new() -> anyhow::Result<Self> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(MAX_RETRIES);
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        let inner = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        Ok(Self { inner })
    }

    /// GETs an absolute URL and deserializes the body, failing on a non-2xx status.
    pub async fn get_json<T: DeserializeOwned>(&self, target: &str) -> anyhow::Result<T> {
        let url = Url::parse(target).with_context(|| format!("Invalid URL '{target}'"))?;
        let response = self.inner.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("HTTP {} from {}: {}", status.as_u16(), target, body.trim());
        }
        response
            .json::<T>()
            .await
            .with_context(|| format!("Invalid JSON from {target}"))
    }
}
