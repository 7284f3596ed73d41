use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use crate::error::ScoutError;

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "moonshot")]
    Moonshot,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "mistral")]
    Mistral,
    #[serde(rename = "openrouter")]
    #[default]
    OpenRouter,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Moonshot => write!(f, "moonshot"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Mistral => write!(f, "mistral"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "moonshot" => Ok(LLMProvider::Moonshot),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "mistral" => Ok(LLMProvider::Mistral),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "gemini" => Ok(LLMProvider::Gemini),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

impl LLMProvider {
    /// 是否需要API KEY
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LLMProvider::Ollama)
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// 日志文件路径，为空时只输出到终端
    pub log_file: Option<PathBuf>,

    /// 是否启用详细日志
    pub verbose: bool,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 搜索与抓取服务配置
    pub search: SearchConfig,

    /// 调研流程配置
    pub pipeline: PipelineConfig,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 高能效模型，用于候选提取与结构化分析
    pub model_efficient: String,

    /// 高质量模型，用于长prompt与最终推荐，同时作为efficient失效情况下的兜底
    pub model_powerful: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 超时时间（秒）
    pub timeout_seconds: u64,

    /// 单个阶段内的最大并发数
    pub max_parallels: usize,
}

/// 搜索与抓取服务（Firecrawl）配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Firecrawl API KEY
    pub api_key: String,

    /// Firecrawl API基地址
    pub api_base_url: String,

    /// 请求超时时间（秒）
    pub timeout_seconds: u64,

    /// 查找官网时附加在工具名后的消歧短语
    pub site_query_suffix: String,
}

/// 调研流程配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    /// 候选工具数量上限
    pub max_candidates: usize,

    /// 提取候选前是否先检索对比文章作为上下文
    pub gather_articles: bool,

    /// 检索对比文章的数量
    pub article_results: usize,

    /// 每篇文章截取的字符数
    pub article_excerpt_chars: usize,

    /// 送入结构化分析的页面内容最大字符数
    pub max_content_chars: usize,

    /// 结构化分析的总尝试次数（含首次）
    pub analysis_attempts: u32,

    /// 最终推荐的总尝试次数（含首次）
    pub synthesis_attempts: u32,

    /// 最终推荐首次重试的等待时间（毫秒），之后每次翻倍
    pub synthesis_retry_delay_ms: u64,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 校验配置，一次性返回全部问题
    pub fn validate(&self) -> Result<(), ScoutError> {
        let mut errors = Vec::new();

        if self.llm.provider.requires_api_key() && self.llm.api_key.trim().is_empty() {
            errors.push(format!(
                "llm.api_key is required for {} (set TOOLSCOUT_LLM_API_KEY)",
                self.llm.provider
            ));
        }
        if self.llm.model_efficient.trim().is_empty() {
            errors.push("llm.model_efficient is required".to_string());
        }
        if self.llm.temperature < 0.0 {
            errors.push("llm.temperature must be a non-negative number".to_string());
        }
        if self.llm.max_parallels == 0 {
            errors.push("llm.max_parallels must be at least 1".to_string());
        }
        if self.search.api_key.trim().is_empty() {
            errors.push("search.api_key is required (set FIRECRAWL_API_KEY)".to_string());
        }
        if self.pipeline.max_candidates == 0 {
            errors.push("pipeline.max_candidates must be at least 1".to_string());
        }
        if self.pipeline.analysis_attempts == 0 {
            errors.push("pipeline.analysis_attempts must be at least 1".to_string());
        }
        if self.pipeline.synthesis_attempts == 0 {
            errors.push("pipeline.synthesis_attempts must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ScoutError::Config(
                errors
                    .iter()
                    .map(|e| format!("  - {}", e))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ))
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("TOOLSCOUT_LLM_API_KEY").unwrap_or_default(),
            api_base_url: String::from("https://openrouter.ai/api/v1"),
            model_efficient: String::from("qwen/qwen3-14b:free"),
            model_powerful: String::from("qwen/qwen3-235b-a22b:free"),
            max_tokens: 8192,
            temperature: 0.0,
            retry_attempts: 2,
            retry_delay_ms: 2000,
            timeout_seconds: 120,
            max_parallels: 3,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("FIRECRAWL_API_KEY").unwrap_or_default(),
            api_base_url: String::from("https://api.firecrawl.dev"),
            timeout_seconds: 60,
            site_query_suffix: String::from("official site"),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_candidates: 5,
            gather_articles: true,
            article_results: 3,
            article_excerpt_chars: 1500,
            max_content_chars: 12_000,
            analysis_attempts: 2,
            synthesis_attempts: 3,
            synthesis_retry_delay_ms: 2000,
        }
    }
}
