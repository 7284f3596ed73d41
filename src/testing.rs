//! 按脚本回复的协作方实现，用于在不访问网络的情况下驱动调研流程

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{ScoutError, ScoutResult};
use crate::llm::LanguageModel;
use crate::search::WebSearch;
use crate::types::{ScrapedPage, SearchHit};

type CompletionReply = Box<dyn Fn(&str) -> ScoutResult<String> + Send + Sync>;
type StructuredReply = Box<dyn Fn(&str) -> ScoutResult<serde_json::Value> + Send + Sync>;

/// 按system prompt分派回复的语言模型
#[derive(Default)]
pub struct ScriptedLanguageModel {
    completions: HashMap<String, CompletionReply>,
    structured: Option<StructuredReply>,
    completion_calls: Mutex<Vec<(String, String)>>,
    structured_calls: Mutex<Vec<String>>,
}

impl ScriptedLanguageModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 对指定system prompt的自由文本调用返回脚本回复，闭包参数为user prompt
    pub fn on_complete<F>(mut self, system_prompt: &str, reply: F) -> Self
    where
        F: Fn(&str) -> ScoutResult<String> + Send + Sync + 'static,
    {
        self.completions
            .insert(system_prompt.to_string(), Box::new(reply));
        self
    }

    /// 结构化调用的脚本回复，闭包参数为user prompt
    pub fn on_structured<F>(mut self, reply: F) -> Self
    where
        F: Fn(&str) -> ScoutResult<serde_json::Value> + Send + Sync + 'static,
    {
        self.structured = Some(Box::new(reply));
        self
    }

    pub fn completion_count(&self) -> usize {
        lock(&self.completion_calls).len()
    }

    /// 指定system prompt下的自由文本调用次数
    pub fn completion_count_for(&self, system_prompt: &str) -> usize {
        lock(&self.completion_calls)
            .iter()
            .filter(|(system, _)| system == system_prompt)
            .count()
    }

    pub fn structured_count(&self) -> usize {
        lock(&self.structured_calls).len()
    }

    /// 所有结构化调用收到的user prompt
    pub fn structured_prompts(&self) -> Vec<String> {
        lock(&self.structured_calls).clone()
    }

    /// 指定system prompt下最后一次收到的user prompt
    pub fn last_prompt_for(&self, system_prompt: &str) -> Option<String> {
        lock(&self.completion_calls)
            .iter()
            .rev()
            .find(|(system, _)| system == system_prompt)
            .map(|(_, user)| user.clone())
    }
}

#[async_trait]
impl LanguageModel for ScriptedLanguageModel {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> ScoutResult<String> {
        lock(&self.completion_calls).push((system_prompt.to_string(), user_prompt.to_string()));
        match self.completions.get(system_prompt) {
            Some(reply) => reply(user_prompt),
            None => Err(ScoutError::Collaborator(
                "no scripted completion for this system prompt".to_string(),
            )),
        }
    }

    async fn complete_structured<T>(&self, _system_prompt: &str, user_prompt: &str) -> ScoutResult<T>
    where
        T: JsonSchema + DeserializeOwned + Serialize + Send + Sync + 'static,
    {
        lock(&self.structured_calls).push(user_prompt.to_string());
        let value = match &self.structured {
            Some(reply) => reply(user_prompt)?,
            None => {
                return Err(ScoutError::Collaborator(
                    "no scripted structured reply".to_string(),
                ));
            }
        };
        serde_json::from_value(value).map_err(|e| ScoutError::SchemaValidation(e.to_string()))
    }
}

/// 内存中的搜索与抓取实现
#[derive(Default)]
pub struct ScriptedWebSearch {
    hits: HashMap<String, Vec<SearchHit>>,
    pages: HashMap<String, ScrapedPage>,
    delays: HashMap<String, Duration>,
    search_calls: AtomicUsize,
    scrape_calls: AtomicUsize,
    scrape_order: Mutex<Vec<String>>,
}

impl ScriptedWebSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为精确匹配的查询登记一条搜索结果
    pub fn with_hit(mut self, query: &str, url: &str) -> Self {
        self.hits.entry(query.to_string()).or_default().push(SearchHit {
            url: url.to_string(),
            title: String::new(),
            snippet: String::new(),
        });
        self
    }

    /// 登记一个可抓取的页面；未登记的URL抓取失败
    pub fn with_page(mut self, url: &str, markdown: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            ScrapedPage {
                url: url.to_string(),
                title: None,
                markdown: markdown.to_string(),
            },
        );
        self
    }

    /// 抓取该URL前先等待一段时间
    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    /// 同时登记`"{name} {suffix}"`的搜索结果与对应页面
    pub fn with_tool(self, name: &str, suffix: &str, url: &str, markdown: &str) -> Self {
        self.with_hit(&format!("{} {}", name, suffix), url)
            .with_page(url, markdown)
    }

    pub fn search_count(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn scrape_count(&self) -> usize {
        self.scrape_calls.load(Ordering::SeqCst)
    }

    /// 按完成先后排列的抓取URL
    pub fn scrape_order(&self) -> Vec<String> {
        lock(&self.scrape_order).clone()
    }
}

#[async_trait]
impl WebSearch for ScriptedWebSearch {
    async fn search(&self, query: &str, limit: usize) -> ScoutResult<Vec<SearchHit>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .hits
            .get(query)
            .map(|hits| hits.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn scrape(&self, url: &str) -> ScoutResult<ScrapedPage> {
        self.scrape_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        let page = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScoutError::fetch(url, "no scripted page"));
        lock(&self.scrape_order).push(url.to_string());
        page
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
