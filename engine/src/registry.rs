//! crates.io search client.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const CRATES_IO_BASE: &str = "https://crates.io";

/// One search hit, trimmed to what the editor displays.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrateSummary {
    pub name: String,
    pub max_version: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    crates: Vec<CrateSummary>,
}

/// Stateless request/response client for the registry. No retry, no cache.
pub struct RegistryClient {
    http: reqwest::Client,
    base: String,
}

impl RegistryClient {
    pub fn new() -> Result<Self> {
        Self::with_base(CRATES_IO_BASE.to_string())
    }

    /// crates.io requires a descriptive User-Agent.
    fn with_base(base: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("caravel/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building registry HTTP client")?;
        Ok(Self { http, base })
    }

    /// Search the registry, returning at most `limit` results.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<CrateSummary>> {
        let url = format!("{}/api/v1/crates", self.base);
        let per_page = limit.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[("q", query), ("per_page", per_page.as_str())])
            .send()
            .await
            .context("sending registry search request")?
            .error_for_status()
            .context("registry search returned an error status")?;

        let body: SearchResponse = response
            .json()
            .await
            .context("decoding registry search response")?;
        tracing::debug!(query, hits = body.crates.len(), "registry search");
        Ok(body.crates)
    }
}
