//! 汇总推荐

use std::time::Duration;

use crate::llm::LanguageModel;
use crate::search::WebSearch;
use crate::types::ToolRecord;
use crate::utils::retry::{RetryPolicy, retry_with_backoff};
use crate::workflow::context::WorkflowContext;

pub const SYSTEM_PROMPT: &str = "You are a senior software engineer providing quick, concise tech recommendations. Keep responses brief and actionable - maximum 3-4 sentences total.";

/// 没有任何候选工具时的固定回复
pub const NO_TOOLS_FOUND_MESSAGE: &str =
    "No tools found for this query. Try rephrasing it or naming a more specific category of developer tools.";

/// 基于全部工具记录生成对比与推荐
///
/// 记录为空时直接返回固定文案；模型多次失败后返回列出各工具官网的降级文本。
pub async fn synthesize<L, S>(
    context: &WorkflowContext<L, S>,
    query: &str,
    records: &[ToolRecord],
) -> String
where
    L: LanguageModel,
    S: WebSearch,
{
    if records.is_empty() {
        return NO_TOOLS_FOUND_MESSAGE.to_string();
    }

    let summaries = records
        .iter()
        .map(ToolRecord::compact_summary)
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = format!(include_str!("prompts/recommendation_user.tpl"), query, summaries);

    let pipeline = &context.config.pipeline;
    let policy = RetryPolicy::exponential(
        pipeline.synthesis_attempts,
        Duration::from_millis(pipeline.synthesis_retry_delay_ms),
    );

    tracing::info!("🧠 生成推荐结论...");
    match retry_with_backoff(policy, "生成推荐", || {
        context.llm.complete(SYSTEM_PROMPT, &prompt)
    })
    .await
    {
        Ok(analysis) => {
            tracing::info!("✅ 推荐结论生成完成");
            analysis
        }
        Err(e) => {
            tracing::error!("❌ 多次尝试后仍无法生成推荐，使用降级文本: {}", e);
            fallback_analysis(query, records)
        }
    }
}

/// 模型不可用时的降级文本
pub fn fallback_analysis(query: &str, records: &[ToolRecord]) -> String {
    let tools = records
        .iter()
        .map(|record| {
            format!(
                "- {}: {}",
                record.name,
                record.website.as_deref().unwrap_or("website unknown")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analysis temporarily unavailable.\n\nFound {} tools for query: {}\n\nTools analyzed:\n{}\n\nPlease try again later for a detailed recommendation.",
        records.len(),
        query,
        tools
    )
}
