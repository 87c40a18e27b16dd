//! Remote Metadata Client
//!
//! Thin HTTP client for the upstream movie metadata API. Used as the remote
//! side of cache-aside lookups. No retries: a failed call surfaces as an error.

use std::time::Duration;

use anyhow::{bail, Context};
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct MetadataClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MetadataClient {
    /// Creates a client for `base_url` authenticating with `api_key`.
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building metadata HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Builds a client when both the URL and key are configured.
    pub fn from_config(config: &Config) -> anyhow::Result<Option<Self>> {
        match (&config.metadata_api_url, &config.metadata_api_key) {
            (Some(url), Some(key)) => Ok(Some(Self::new(url, key)?)),
            _ => Ok(None),
        }
    }

    /// URL of the multi-search endpoint for `term`.
    pub fn search_url(&self, term: &str) -> anyhow::Result<Url> {
        Url::parse_with_params(&format!("{}/search/multi", self.base_url), &[("query", term)])
            .with_context(|| format!("invalid metadata API base URL: {}", self.base_url))
    }

    // == Search ==
    /// Runs a multi-search for `term` and returns the raw JSON page.
    pub async fn search(&self, term: &str) -> anyhow::Result<Value> {
        let url = self.search_url(term)?;
        debug!(term, "Querying metadata API");

        let response = self
            .http
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("metadata API request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("metadata API returned {}", status);
        }

        response
            .json::<Value>()
            .await
            .context("metadata API returned invalid JSON")
    }
}
