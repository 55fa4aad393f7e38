use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{SearchClient, SearchHit};
use crate::config::SearchConfig;

/// Tavily搜索与提取客户端
#[derive(Clone)]
pub struct TavilyClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
    include_raw_content: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    url: String,
}

#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    urls: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    results: Vec<ExtractResult>,
}

#[derive(Debug, Deserialize)]
struct ExtractResult {
    #[serde(default)]
    raw_content: Option<String>,
}

impl TavilyClient {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build HTTP client for Tavily")?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de> + Send,
    {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Tavily request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("Tavily {} returned {}: {}", path, status, detail));
        }

        response
            .json::<R>()
            .await
            .with_context(|| format!("Failed to decode Tavily {} response", path))
    }
}

fn hits_from(response: SearchResponse, max_results: usize) -> Vec<SearchHit> {
    response
        .results
        .into_iter()
        .take(max_results)
        .map(|r| SearchHit {
            title: r.title,
            url: r.url,
        })
        .collect()
}

fn content_from(response: ExtractResponse) -> Option<String> {
    response
        .results
        .into_iter()
        .next()
        .and_then(|r| r.raw_content)
        .filter(|content| !content.trim().is_empty())
}

#[async_trait]
impl SearchClient for TavilyClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let request = SearchRequest {
            query,
            max_results,
            include_raw_content: false,
        };
        let response: SearchResponse = self.post("search", &request).await?;
        let hits = hits_from(response, max_results);
        debug!(query, hits = hits.len(), "tavily search finished");
        Ok(hits)
    }

    async fn extract(&self, url: &str) -> Result<Option<String>> {
        let request = ExtractRequest { urls: [url] };
        let response: ExtractResponse = self.post("extract", &request).await?;
        Ok(content_from(response))
    }
}
