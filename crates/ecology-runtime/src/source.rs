//! Paginated record sources.

use std::time::Duration;

use async_trait::async_trait;
use ecology_core::error::{EcologyError, Result};
use ecology_core::models::RawRecord;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One page of the monsters API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPage {
    #[serde(default)]
    pub results: Vec<RawRecord>,
    /// URL of the following page, absent on the last one.
    #[serde(default)]
    pub next: Option<String>,
}

/// Anything that can deliver a page of raw records for a URL.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<RawPage>;
}

/// [`PageSource`] backed by an HTTP JSON API.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("monster-ecology/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EcologyError::Config(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

fn unavailable(url: &str, reason: impl ToString) -> EcologyError {
    EcologyError::SourceUnavailable {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, url: &str) -> Result<RawPage> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unavailable(url, e))?
            .error_for_status()
            .map_err(|e| unavailable(url, e))?;
        let page: RawPage = response
            .json()
            .await
            .map_err(|e| unavailable(url, format!("invalid page body: {e}")))?;
        debug!("{} records from {}", page.results.len(), url);
        Ok(page)
    }
}
