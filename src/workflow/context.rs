use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::llm::{LLMClient, LanguageModel};
use crate::search::{FirecrawlClient, WebSearch};

/// 一次进程内所有调研共享的协作方与配置
pub struct WorkflowContext<L, S> {
    /// 语言模型，用于提取候选、分析页面和生成推荐
    pub llm: Arc<L>,
    /// 网页搜索与抓取
    pub search: Arc<S>,
    /// 配置
    pub config: Config,
}

impl<L, S> Clone for WorkflowContext<L, S> {
    fn clone(&self) -> Self {
        Self {
            llm: Arc::clone(&self.llm),
            search: Arc::clone(&self.search),
            config: self.config.clone(),
        }
    }
}

impl<L, S> WorkflowContext<L, S>
where
    L: LanguageModel,
    S: WebSearch,
{
    pub fn new(llm: Arc<L>, search: Arc<S>, config: Config) -> Self {
        Self {
            llm,
            search,
            config,
        }
    }
}

impl WorkflowContext<LLMClient, FirecrawlClient> {
    /// 按配置创建生产环境使用的协作方
    pub fn from_config(config: Config) -> Result<Self> {
        let llm = LLMClient::new(config.llm.clone())?;
        let search = FirecrawlClient::new(&config.search)?;
        Ok(Self::new(Arc::new(llm), Arc::new(search), config))
    }
}
