//! 候选工具提取

use crate::error::ScoutResult;
use crate::llm::LanguageModel;
use crate::search::WebSearch;
use crate::types::{CandidateNames, validate_query};
use crate::utils::text::strip_think_blocks;
use crate::utils::threads::do_parallel_with_limit;
use crate::workflow::context::WorkflowContext;

pub const SYSTEM_PROMPT: &str = "You are a tech researcher. Extract specific tool, library, platform, or service names from articles. Focus on actual products and tools developers can use, not general concepts or features.";

/// 单行超过该长度时视为说明性文字而不是工具名
const MAX_NAME_CHARS: usize = 80;

/// 从查询中提取候选工具名称
///
/// 查询为空时返回`InvalidInput`；模型调用失败或回复中没有可用名称时返回空列表。
pub async fn extract_candidates<L, S>(
    context: &WorkflowContext<L, S>,
    query: &str,
) -> ScoutResult<CandidateNames>
where
    L: LanguageModel,
    S: WebSearch,
{
    let query = validate_query(query)?;
    let pipeline = &context.config.pipeline;

    let articles = if pipeline.gather_articles {
        gather_article_context(context, query).await
    } else {
        String::new()
    };

    let prompt = format!(
        include_str!("prompts/extraction_user.tpl"),
        query, articles, pipeline.max_candidates
    );

    let reply = match context.llm.complete(SYSTEM_PROMPT, &prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!("❌ 提取候选工具失败: {}", e);
            return Ok(CandidateNames::default());
        }
    };

    let candidates = CandidateNames::new(parse_tool_names(&reply), pipeline.max_candidates);
    if candidates.is_empty() {
        tracing::warn!("⚠️ 模型回复中没有可用的工具名称");
    } else {
        tracing::info!(
            "✅ 提取到候选工具: {}",
            candidates.as_slice().join(", ")
        );
    }
    Ok(candidates)
}

/// 搜索对比类文章并拼接每篇的开头片段，任何失败都只会让上下文变少
async fn gather_article_context<L, S>(context: &WorkflowContext<L, S>, query: &str) -> String
where
    L: LanguageModel,
    S: WebSearch,
{
    let pipeline = &context.config.pipeline;
    let article_query = format!("{} tools comparison best alternatives", query);
    tracing::info!("🔍 查找相关文章: {}", query);

    let hits = match context
        .search
        .search(&article_query, pipeline.article_results)
        .await
    {
        Ok(hits) => hits,
        Err(e) => {
            tracing::warn!("⚠️ 文章搜索失败，将不带上下文提取: {}", e);
            return String::new();
        }
    };

    let scrapes = hits
        .iter()
        .map(|hit| context.search.scrape(&hit.url))
        .collect::<Vec<_>>();
    let pages = do_parallel_with_limit(scrapes, context.config.llm.max_parallels).await;

    let mut content = String::new();
    for page in pages {
        match page {
            Ok(page) => {
                content.extend(page.markdown.chars().take(pipeline.article_excerpt_chars));
                content.push_str("\n\n");
            }
            Err(e) => tracing::debug!("跳过无法抓取的文章: {}", e),
        }
    }
    content
}

/// 把模型回复解析为工具名称，每行一个
pub fn parse_tool_names(reply: &str) -> Vec<String> {
    strip_think_blocks(reply)
        .lines()
        .filter_map(clean_line)
        .collect()
}

/// 模型常用的开场白，整行丢弃
const LEAD_INS: &[&str] = &[
    "sure",
    "certainly",
    "of course",
    "okay",
    "here are",
    "here is",
    "here's",
    "these are",
    "the following",
    "below are",
    "i recommend",
    "note",
];

/// 工具名与描述之间的分隔符
const DESCRIPTION_SEPARATORS: &[&str] = &[" - ", " – ", " — "];

fn clean_line(line: &str) -> Option<String> {
    let line = strip_list_marker(line.trim());
    let line: String = line.chars().filter(|c| !matches!(c, '*' | '`')).collect();
    let line = line.trim();

    if line.is_empty() || line.ends_with(':') || starts_with_lead_in(line) {
        return None;
    }

    let name = DESCRIPTION_SEPARATORS
        .iter()
        .filter_map(|sep| line.find(sep))
        .min()
        .map_or(line, |pos| &line[..pos]);
    let name = name
        .trim_matches(|c: char| matches!(c, '_' | '"' | '\'' | '“' | '”'))
        .trim();

    if name.is_empty()
        || name.ends_with(['.', '!', '?', ':'])
        || name.chars().count() > MAX_NAME_CHARS
    {
        return None;
    }
    Some(name.to_string())
}

fn starts_with_lead_in(line: &str) -> bool {
    let lower = line.to_lowercase();
    LEAD_INS.iter().any(|lead| {
        lower
            .strip_prefix(lead)
            .is_some_and(|rest| !rest.starts_with(char::is_alphanumeric))
    })
}

fn strip_list_marker(line: &str) -> &str {
    for bullet in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return rest.trim_start();
        }
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            if rest.starts_with(char::is_whitespace) {
                return rest.trim_start();
            }
        }
    }
    line
}
