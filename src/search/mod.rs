//! 网页搜索与抓取协作方

use async_trait::async_trait;

use crate::error::ScoutResult;
use crate::types::{ScrapedPage, SearchHit};

pub mod firecrawl;

pub use firecrawl::FirecrawlClient;

#[async_trait]
pub trait WebSearch: Send + Sync {
    /// 搜索网页，最多返回`limit`条结果
    async fn search(&self, query: &str, limit: usize) -> ScoutResult<Vec<SearchHit>>;

    /// 抓取页面正文（markdown）
    async fn scrape(&self, url: &str) -> ScoutResult<ScrapedPage>;
}
