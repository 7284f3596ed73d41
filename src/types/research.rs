use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ScoutError, ScoutResult};
use crate::types::tool::{ToolRecord, dedup_case_insensitive};

/// 校验用户查询，去除首尾空白后不能为空
pub fn validate_query(query: &str) -> ScoutResult<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ScoutError::InvalidInput(
            "query must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

/// 候选工具名称列表
///
/// 构造后不可变：已按大小写不敏感去重，并截断到上限。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CandidateNames(Vec<String>);

impl CandidateNames {
    pub fn new<I, S>(names: I, cap: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names = dedup_case_insensitive(names);
        names.truncate(cap);
        Self(names)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a CandidateNames {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// 搜索结果条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// 抓取到的页面
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub url: String,
    pub title: Option<String>,
    pub markdown: String,
}

/// 与某个候选工具关联的页面内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub name: String,
    pub url: String,
    pub title: Option<String>,
    pub markdown: String,
}

impl PageContent {
    pub fn from_scraped(name: impl Into<String>, page: ScrapedPage) -> Self {
        Self {
            name: name.into(),
            url: page.url,
            title: page.title,
            markdown: page.markdown,
        }
    }
}

/// 一次调研的最终结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    query: String,
    tools: Vec<ToolRecord>,
    analysis: String,
    generated_at: DateTime<Utc>,
}

impl RecommendationResult {
    pub fn new(query: impl Into<String>, tools: Vec<ToolRecord>, analysis: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            tools,
            analysis: analysis.into(),
            generated_at: Utc::now(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn tools(&self) -> &[ToolRecord] {
        &self.tools
    }

    pub fn analysis(&self) -> &str {
        &self.analysis
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_query() {
        assert_eq!(validate_query("  ci tools ").unwrap(), "ci tools");
        assert!(matches!(
            validate_query("   \n\t"),
            Err(ScoutError::InvalidInput(_))
        ));
        assert!(validate_query("").is_err());
    }

    #[test]
    fn test_candidate_names_dedup_and_cap() {
        let names = CandidateNames::new(["Docker", "docker", "DOCKER"], 5);
        assert_eq!(names.as_slice(), &["Docker".to_string()]);

        let names = CandidateNames::new(["A", "B", "C", "D", "E", "F", "G"], 5);
        assert_eq!(names.len(), 5);
        assert_eq!(names.as_slice().last().map(String::as_str), Some("E"));
    }

    #[test]
    fn test_recommendation_result_accessors() {
        let result = RecommendationResult::new("q", vec![ToolRecord::unknown("A")], "text");
        assert_eq!(result.query(), "q");
        assert_eq!(result.tools().len(), 1);
        assert_eq!(result.analysis(), "text");
    }
}
