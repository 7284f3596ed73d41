//! Firecrawl v1 REST接口适配

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::SearchConfig;
use crate::error::{ScoutError, ScoutResult};
use crate::search::WebSearch;
use crate::types::{ScrapedPage, SearchHit};

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'a str; 1],
    only_main_content: bool,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    metadata: Option<ScrapeMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeMetadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "sourceURL", default)]
    source_url: Option<String>,
}

/// Firecrawl客户端
#[derive(Clone)]
pub struct FirecrawlClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl FirecrawlClient {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build Firecrawl HTTP client")?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 发送POST请求并解析Firecrawl的统一响应包装
    async fn post<B, T>(&self, endpoint: &str, target: &str, body: &B) -> ScoutResult<T>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/v1/{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("⚠️ Firecrawl请求失败 {}: {}", target, e);
                ScoutError::fetch(target, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            tracing::warn!("⚠️ Firecrawl返回错误状态 {} ({}): {}", status, target, message);
            return Err(ScoutError::fetch(target, format!("HTTP {}: {}", status, message)));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ScoutError::fetch(target, format!("malformed response: {}", e)))?;

        if !envelope.success {
            let reason = envelope
                .error
                .unwrap_or_else(|| "request was not successful".to_string());
            return Err(ScoutError::fetch(target, reason));
        }

        envelope
            .data
            .ok_or_else(|| ScoutError::fetch(target, "response carried no data"))
    }
}

#[async_trait]
impl WebSearch for FirecrawlClient {
    async fn search(&self, query: &str, limit: usize) -> ScoutResult<Vec<SearchHit>> {
        tracing::debug!("🔍 搜索: {} (limit {})", query, limit);
        let items: Vec<SearchItem> = self
            .post("search", query, &SearchRequest { query, limit })
            .await?;

        Ok(items
            .into_iter()
            .take(limit)
            .map(|item| SearchHit {
                url: item.url,
                title: item.title.unwrap_or_default(),
                snippet: item.description.unwrap_or_default(),
            })
            .collect())
    }

    async fn scrape(&self, url: &str) -> ScoutResult<ScrapedPage> {
        tracing::debug!("📄 抓取页面: {}", url);
        let request = ScrapeRequest {
            url,
            formats: ["markdown"],
            only_main_content: true,
        };
        let data: ScrapeData = self.post("scrape", url, &request).await?;

        let markdown = data.markdown.unwrap_or_default();
        if markdown.trim().is_empty() {
            return Err(ScoutError::fetch(url, "page has no markdown content"));
        }

        let metadata = data.metadata;
        let source_url = metadata.as_ref().and_then(|m| m.source_url.clone());
        let title = metadata.and_then(|m| m.title).filter(|t| !t.is_empty());

        Ok(ScrapedPage {
            url: source_url.unwrap_or_else(|| url.to_string()),
            title,
            markdown,
        })
    }
}
