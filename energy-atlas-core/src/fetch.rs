//! Source fetchers: retrieve the raw CSV text of a dataset.
//!
//! [`HttpSourceFetcher`] performs a GET against the configured URL with a
//! per-request timeout and bounded exponential-backoff retry on transient
//! failures. [`StaticSourceFetcher`] serves payloads from memory.

use crate::config::{RetryConfig, SourcesConfig};
use crate::dataset::DatasetKind;
use crate::error::{EnergyError, FetchError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Retrieves the raw CSV payload for one dataset.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, kind: DatasetKind) -> Result<String>;
}

/// Fetches datasets over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpSourceFetcher {
    client: reqwest::Client,
    urls: HashMap<DatasetKind, String>,
    timeout: Duration,
    retry: RetryConfig,
}

impl HttpSourceFetcher {
    pub fn from_config(config: &SourcesConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        let urls = DatasetKind::ALL
            .into_iter()
            .map(|k| (k, config.url_for(k).to_string()))
            .collect();
        Ok(Self {
            client,
            urls,
            timeout: config.timeout(),
            retry: config.retry.clone(),
        })
    }

    /// Point one dataset at a different URL.
    pub fn with_url(mut self, kind: DatasetKind, url: impl Into<String>) -> Self {
        self.urls.insert(kind, url.into());
        self
    }

    async fn get_once(&self, url: &str) -> std::result::Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| self.transport_error(url, e))
    }

    fn transport_error(&self, url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self, kind: DatasetKind) -> Result<String> {
        let url = self
            .urls
            .get(&kind)
            .ok_or(FetchError::UnknownSource { dataset: kind })?;
        let started = Instant::now();
        let body = with_retry(&self.retry, || self.get_once(url)).await?;
        info!(
            dataset = %kind,
            url = %url,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched source"
        );
        Ok(body)
    }
}

/// Serves fixed payloads from memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSourceFetcher {
    payloads: HashMap<DatasetKind, String>,
}

impl StaticSourceFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(mut self, kind: DatasetKind, payload: impl Into<String>) -> Self {
        self.payloads.insert(kind, payload.into());
        self
    }
}

#[async_trait]
impl SourceFetcher for StaticSourceFetcher {
    async fn fetch(&self, kind: DatasetKind) -> Result<String> {
        self.payloads
            .get(&kind)
            .cloned()
            .ok_or_else(|| EnergyError::Fetch(FetchError::UnknownSource { dataset: kind }))
    }
}

/// Run `operation` with exponential backoff while it fails with a retryable error.
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    operation: F,
) -> std::result::Result<T, FetchError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, FetchError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                if !e.is_retryable() || attempt >= config.max_retries {
                    return Err(e);
                }
                let backoff_ms = compute_backoff(config, attempt);
                warn!(
                    attempt = attempt + 1,
                    max = config.max_retries,
                    backoff_ms,
                    error = %e,
                    "Retrying source fetch after transient error"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                attempt += 1;
            }
        }
    }
}

fn compute_backoff(config: &RetryConfig, attempt: u32) -> u64 {
    let base = config.initial_backoff_ms as f64 * config.backoff_multiplier.powi(attempt as i32);
    base.min(config.max_backoff_ms as f64) as u64
}
