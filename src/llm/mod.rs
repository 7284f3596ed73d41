//! 语言模型协作方

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::ScoutResult;

pub mod client;

pub use client::LLMClient;

/// 调研流程依赖的语言模型能力
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// 自由文本补全
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> ScoutResult<String>;

    /// 结构化补全，输出必须能按`T`的JSON Schema解析，否则返回`SchemaValidation`
    async fn complete_structured<T>(&self, system_prompt: &str, user_prompt: &str) -> ScoutResult<T>
    where
        T: JsonSchema + DeserializeOwned + Serialize + Send + Sync + 'static;
}
