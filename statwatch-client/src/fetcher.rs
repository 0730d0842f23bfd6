use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use statwatch_shared::metrics::{MetricSnapshot, ParseError};
use tracing::debug;

/// Everything that can go wrong between asking for statistics and holding a
/// parsed snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP request failed with status {0}")]
    HttpStatus(StatusCode),

    #[error("malformed statistics payload: {0}")]
    Parse(#[from] ParseError),
}

/// Source of raw statistics payloads.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch(&self) -> Result<String, StatsError>;

    /// Fetch and parse in one step.
    async fn fetch_snapshot(&self) -> Result<MetricSnapshot, StatsError> {
        let body = self.fetch().await?;
        Ok(MetricSnapshot::parse(&body)?)
    }
}

/// Fetches statistics with a plain GET against a fixed endpoint.
pub struct HttpFetcher {
    endpoint: Url,
    client: Client,
}

impl HttpFetcher {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid statistics endpoint: {endpoint}"))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl StatsSource for HttpFetcher {
    async fn fetch(&self) -> Result<String, StatsError> {
        debug!(endpoint = %self.endpoint, "Fetching server statistics");
        let response = self.client.get(self.endpoint.clone()).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(StatsError::HttpStatus(status));
        }

        Ok(response.text().await?)
    }
}
