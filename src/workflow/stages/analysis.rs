//! 单个工具的结构化分析

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::llm::LanguageModel;
use crate::search::WebSearch;
use crate::types::{CandidateNames, PageContent, PricingModel, ToolRecord, TriState};
use crate::types::tool::dedup_case_insensitive;
use crate::utils::retry::{RetryPolicy, retry_with_backoff};
use crate::utils::text::truncate_chars;
use crate::utils::threads::do_parallel_with_limit;
use crate::workflow::context::WorkflowContext;

pub const SYSTEM_PROMPT: &str = "You are analyzing developer tools and programming technologies. Focus on extracting information relevant to programmers and software developers. Pay special attention to programming languages, frameworks, APIs, SDKs, and development workflows.";

/// 模型需要填写的分析结果，缺失的字段一律按未知处理
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ToolAnalysis {
    /// One of: Free, Freemium, Paid, Enterprise, Unknown
    #[serde(default)]
    pub pricing_model: String,
    /// Whether the tool is open source; omit when unclear
    #[serde(default)]
    pub is_open_source: Option<bool>,
    /// Technologies the tool is built with or supports
    #[serde(default)]
    pub tech_stack: Vec<String>,
    /// Programming languages the tool works with
    #[serde(default)]
    pub supported_languages: Vec<String>,
    /// Whether an API or SDK is available; omit when unclear
    #[serde(default)]
    pub has_api: Option<bool>,
    /// Platforms and tools it integrates with
    #[serde(default)]
    pub integrations: Vec<String>,
    /// One-sentence description focused on what the tool does for developers
    #[serde(default)]
    pub description: String,
    /// Official website URL, if stated in the content
    #[serde(default)]
    pub website: Option<String>,
}

impl ToolAnalysis {
    /// 归一化为工具记录，官网以抓取页面的URL为准
    pub fn into_record(self, name: &str, page_url: Option<&str>) -> ToolRecord {
        let website = match page_url {
            Some(url) => Some(url.to_string()),
            None => self.website.filter(|url| is_http_url(url)),
        };

        ToolRecord {
            name: name.to_string(),
            website,
            pricing_model: PricingModel::from_label(&self.pricing_model),
            is_open_source: TriState::from(self.is_open_source),
            tech_stack: dedup_case_insensitive(self.tech_stack),
            supported_languages: dedup_case_insensitive(self.supported_languages),
            has_api: TriState::from(self.has_api),
            integrations: dedup_case_insensitive(self.integrations),
            description: self.description.trim().to_string(),
        }
    }
}

fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("https://") || url.starts_with("http://")
}

/// 分析单个工具；没有页面内容时直接返回未知记录，不调用模型
pub async fn analyze<L, S>(
    context: &WorkflowContext<L, S>,
    name: &str,
    content: Option<&PageContent>,
) -> ToolRecord
where
    L: LanguageModel,
    S: WebSearch,
{
    let Some(page) = content else {
        tracing::debug!("{} 没有页面内容，跳过分析", name);
        return ToolRecord::unknown(name);
    };

    let pipeline = &context.config.pipeline;
    let prompt = format!(
        include_str!("prompts/analysis_user.tpl"),
        name,
        page.url,
        truncate_chars(&page.markdown, pipeline.max_content_chars)
    );

    let label = format!("分析 {}", name);
    let policy = RetryPolicy::immediate(pipeline.analysis_attempts);
    let result = retry_with_backoff(policy, &label, || {
        context
            .llm
            .complete_structured::<ToolAnalysis>(SYSTEM_PROMPT, &prompt)
    })
    .await;

    match result {
        Ok(analysis) => {
            tracing::debug!("✅ 完成分析: {}", name);
            analysis.into_record(name, Some(&page.url))
        }
        Err(e) => {
            tracing::error!("❌ 分析 {} 失败，使用未知记录: {}", name, e);
            ToolRecord::unknown(name).with_website(Some(page.url.clone()))
        }
    }
}

/// 按候选顺序分析所有工具
pub async fn analyze_all<L, S>(
    context: &WorkflowContext<L, S>,
    candidates: &CandidateNames,
    pages: &HashMap<String, Option<PageContent>>,
) -> Vec<ToolRecord>
where
    L: LanguageModel,
    S: WebSearch,
{
    tracing::info!("🔍 开始分析 {} 个工具", candidates.len());

    let futures = candidates
        .iter()
        .map(|name| analyze(context, name, pages.get(name).and_then(Option::as_ref)))
        .collect::<Vec<_>>();
    let records = do_parallel_with_limit(futures, context.config.llm.max_parallels).await;

    let degraded = records.iter().filter(|r| r.is_degraded()).count();
    tracing::info!(
        "✅ 分析完成，{} 个工具中有 {} 个信息不完整",
        records.len(),
        degraded
    );
    records
}
