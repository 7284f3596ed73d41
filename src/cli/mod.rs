use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, LLMProvider};

pub mod display;

/// 默认配置文件名，位于当前工作目录
pub const DEFAULT_CONFIG_FILE: &str = "toolscout.toml";

/// toolscout - 开发者工具调研助手
#[derive(Parser, Debug)]
#[command(name = "toolscout")]
#[command(
    about = "Research developer tools for a query: finds candidate tools, reads their official sites, extracts structured facts and recommends the best fit."
)]
#[command(version)]
pub struct Args {
    /// 调研查询；省略时进入交互模式
    pub query: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// LLM Provider (openai, openrouter, anthropic, gemini, ollama, deepseek, mistral, moonshot)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// 高能效模型，优先用于常规推理任务
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 高质量模型，用于长prompt以及高能效模型失效时的兜底
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 并发处理候选工具的最大数量
    #[arg(long)]
    pub max_parallels: Option<usize>,

    /// Firecrawl API KEY
    #[arg(long)]
    pub firecrawl_api_key: Option<String>,

    /// 最多调研的候选工具数量
    #[arg(long)]
    pub max_candidates: Option<usize>,

    /// 提取候选工具前不搜索对比文章
    #[arg(long)]
    pub no_articles: bool,

    /// 以JSON格式输出结果
    #[arg(long)]
    pub json: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// 日志文件路径
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// 启动时跳过模型连接检查
    #[arg(long)]
    pub skip_connection_check: bool,
}

impl Args {
    /// 将CLI参数转换为配置，命令行参数优先于配置文件
    pub fn into_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(config_path) => Config::from_file(config_path)
                .with_context(|| format!("无法读取配置文件 {:?}", config_path))?,
            None => {
                let default_config_path = std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(DEFAULT_CONFIG_FILE);

                if default_config_path.exists() {
                    Config::from_file(&default_config_path).with_context(|| {
                        format!("无法读取默认配置文件 {:?}", default_config_path)
                    })?
                } else {
                    Config::default()
                }
            }
        };

        // 覆盖LLM配置
        if let Some(provider_str) = &self.llm_provider {
            config.llm.provider = provider_str
                .parse::<LLMProvider>()
                .map_err(anyhow::Error::msg)?;
        }
        if let Some(llm_api_key) = &self.llm_api_key {
            config.llm.api_key = llm_api_key.clone();
        }
        if let Some(llm_api_base_url) = &self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url.clone();
        }
        if let Some(model_efficient) = &self.model_efficient {
            config.llm.model_efficient = model_efficient.clone();
        }
        if let Some(model_powerful) = &self.model_powerful {
            config.llm.model_powerful = model_powerful.clone();
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(max_parallels) = self.max_parallels {
            config.llm.max_parallels = max_parallels;
        }

        // 覆盖搜索与流程配置
        if let Some(firecrawl_api_key) = &self.firecrawl_api_key {
            config.search.api_key = firecrawl_api_key.clone();
        }
        if let Some(max_candidates) = self.max_candidates {
            config.pipeline.max_candidates = max_candidates;
        }
        if self.no_articles {
            config.pipeline.gather_articles = false;
        }

        // 其他配置
        if self.log_file.is_some() {
            config.log_file = self.log_file.clone();
        }
        config.verbose = config.verbose || self.verbose;

        Ok(config)
    }
}

// Include tests
#[cfg(test)]
mod tests;
