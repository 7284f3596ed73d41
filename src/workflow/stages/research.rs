//! 官方页面检索

use std::collections::HashMap;

use crate::error::ScoutResult;
use crate::llm::LanguageModel;
use crate::search::WebSearch;
use crate::types::{CandidateNames, PageContent};
use crate::utils::threads::do_parallel_with_limit;
use crate::workflow::context::WorkflowContext;

/// 为每个候选工具检索并抓取官方页面
///
/// 单个工具找不到页面或抓取失败时记为`None`，不影响其余工具。
pub async fn fetch_pages<L, S>(
    context: &WorkflowContext<L, S>,
    candidates: &CandidateNames,
) -> HashMap<String, Option<PageContent>>
where
    L: LanguageModel,
    S: WebSearch,
{
    tracing::info!("🔬 检索候选工具官网: {}", candidates.as_slice().join(", "));

    let futures = candidates
        .iter()
        .map(|name| fetch_page(context, name))
        .collect::<Vec<_>>();
    let pages = do_parallel_with_limit(futures, context.config.llm.max_parallels).await;

    let mut result = HashMap::with_capacity(candidates.len());
    for (name, page) in candidates.iter().zip(pages) {
        let page = match page {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("⚠️ 无法获取 {} 的页面内容: {}", name, e);
                None
            }
        };
        result.insert(name.clone(), page);
    }

    let found = result.values().filter(|page| page.is_some()).count();
    tracing::info!("✅ 页面检索完成，{}/{} 个工具获取到内容", found, result.len());
    result
}

async fn fetch_page<L, S>(
    context: &WorkflowContext<L, S>,
    name: &str,
) -> ScoutResult<Option<PageContent>>
where
    L: LanguageModel,
    S: WebSearch,
{
    let query = format!("{} {}", name, context.config.search.site_query_suffix);
    let hits = context.search.search(query.trim(), 1).await?;

    let Some(hit) = hits.into_iter().next() else {
        tracing::debug!("没有找到 {} 的搜索结果", name);
        return Ok(None);
    };

    let page = context.search.scrape(&hit.url).await?;
    Ok(Some(PageContent::from_scraped(name, page)))
}
