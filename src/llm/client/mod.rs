//! LLM客户端 - 基于rig的语言模型适配器

use anyhow::Result;
use async_trait::async_trait;
use rig::extractor::ExtractionError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::future::Future;
use std::time::Duration;

use crate::config::LLMConfig;
use crate::error::{ScoutError, ScoutResult};
use crate::llm::LanguageModel;
use crate::utils::retry::{RetryPolicy, retry_with_backoff, retry_with_backoff_if};

mod providers;
pub mod utils;

use providers::ProviderClient;
use utils::evaluate_befitting_model;

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        tracing::info!("🔄 正在检查模型连接（{}）...", self.config.provider);
        match self
            .prompt("System: You are a helpful assistant.", "Hello")
            .await
        {
            Ok(_) => {
                tracing::info!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                tracing::error!("❌ 模型连接失败: {}", e);
                Err(e)
            }
        }
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(
            self.config.retry_attempts,
            Duration::from_millis(self.config.retry_delay_ms),
        )
    }

    /// 为单次调用加上超时限制
    async fn with_timeout<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        let limit = Duration::from_secs(self.config.timeout_seconds);
        match tokio::time::timeout(limit, operation).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::Error::new(ScoutError::Timeout(limit))),
        }
    }

    /// 数据提取方法，主模型多次失败后切换到备选模型
    ///
    /// 模型回复不符合结构（未调用submit或参数反序列化失败）时直接返回，不重试也不切换模型。
    pub async fn extract<T>(&self, system_prompt: &str, user_prompt: &str) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let (befitting_model, fallover_model) =
            evaluate_befitting_model(&self.config, system_prompt, user_prompt);

        let error = match self
            .extract_inner(system_prompt, user_prompt, &befitting_model)
            .await
        {
            Ok(data) => return Ok(data),
            Err(e) => e,
        };

        if is_schema_failure(&error) {
            return Err(error);
        }
        let Some(model) = fallover_model else {
            return Err(error);
        };
        tracing::warn!(
            "❌ 模型 {} 提取失败，尝试使用备选模型 {}...{}",
            befitting_model,
            model,
            error
        );
        let user_prompt_with_fixer = format!(
            "{}\n\n**Note** A previous attempt failed with the error \"{}\". Make sure to avoid it this time.",
            user_prompt, error
        );
        self.extract_inner(system_prompt, &user_prompt_with_fixer, &model)
            .await
    }

    async fn extract_inner<T>(&self, system_prompt: &str, user_prompt: &str, model: &str) -> Result<T>
    where
        T: JsonSchema + for<'a> Deserialize<'a> + Serialize + Send + Sync + 'static,
    {
        let extractor = self
            .client
            .create_extractor::<T>(model, system_prompt, &self.config)?;

        retry_with_backoff_if(
            self.retry_policy(),
            "调用模型提取结构化数据",
            |e: &anyhow::Error| !is_schema_failure(e),
            || async { self.with_timeout(extractor.extract(user_prompt)).await },
        )
        .await
    }

    /// 单轮对话方法（不使用工具）
    pub async fn prompt(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let (befitting_model, _) =
            evaluate_befitting_model(&self.config, system_prompt, user_prompt);
        let agent = self
            .client
            .create_agent(&befitting_model, system_prompt, &self.config)?;

        retry_with_backoff(self.retry_policy(), "调用模型服务", || async {
            self.with_timeout(agent.prompt(user_prompt)).await
        })
        .await
    }
}

/// 模型回复了，但内容不符合目标结构
fn is_schema_failure(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<ExtractionError>(),
        Some(ExtractionError::NoData | ExtractionError::DeserializationError(_))
    )
}

/// 把适配层的错误归入调研流程的错误分类
fn classify(error: anyhow::Error) -> ScoutError {
    if let Some(ScoutError::Timeout(limit)) = error.downcast_ref::<ScoutError>() {
        return ScoutError::Timeout(*limit);
    }
    if is_schema_failure(&error) {
        ScoutError::SchemaValidation(format!("{:#}", error))
    } else {
        ScoutError::Collaborator(format!("{:#}", error))
    }
}

#[async_trait]
impl LanguageModel for LLMClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> ScoutResult<String> {
        self.prompt(system_prompt, user_prompt)
            .await
            .map_err(|e| classify(e))
    }

    async fn complete_structured<T>(&self, system_prompt: &str, user_prompt: &str) -> ScoutResult<T>
    where
        T: JsonSchema + DeserializeOwned + Serialize + Send + Sync + 'static,
    {
        self.extract::<T>(system_prompt, user_prompt)
            .await
            .map_err(|e| classify(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LLMProvider;
    use anyhow::anyhow;
    use rig::completion::CompletionError;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, Serialize, JsonSchema)]
    struct Verdict {
        approved: bool,
    }

    fn openai_config(server: &MockServer) -> LLMConfig {
        LLMConfig {
            provider: LLMProvider::OpenAI,
            api_key: "sk-test".to_string(),
            api_base_url: server.uri(),
            model_efficient: "gpt-small".to_string(),
            model_powerful: "gpt-large".to_string(),
            retry_attempts: 3,
            retry_delay_ms: 0,
            ..Default::default()
        }
    }

    fn chat_completion(message: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 0,
            "model": "gpt-small",
            "choices": [{"index": 0, "message": message, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "total_tokens": 12}
        })
    }

    #[test]
    fn test_classify_timeout() {
        let error = anyhow::Error::new(ScoutError::Timeout(Duration::from_secs(3)));
        assert_eq!(classify(error), ScoutError::Timeout(Duration::from_secs(3)));
    }

    #[test]
    fn test_classify_by_error_kind() {
        assert!(matches!(
            classify(anyhow::Error::new(ExtractionError::NoData)),
            ScoutError::SchemaValidation(_)
        ));
        let bad_json = serde_json::from_str::<Verdict>("{").unwrap_err();
        assert!(matches!(
            classify(anyhow::Error::new(ExtractionError::DeserializationError(bad_json))),
            ScoutError::SchemaValidation(_)
        ));
        let provider_error = ExtractionError::CompletionError(CompletionError::ProviderError(
            "rate limited".to_string(),
        ));
        assert!(matches!(
            classify(anyhow::Error::new(provider_error)),
            ScoutError::Collaborator(_)
        ));
        assert!(matches!(
            classify(anyhow!("connection reset")),
            ScoutError::Collaborator(_)
        ));
    }

    #[tokio::test]
    async fn test_plain_text_reply_fails_schema_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(json!({
                "role": "assistant",
                "content": "I think it should be approved."
            }))))
            .mount(&server)
            .await;

        let client = LLMClient::new(openai_config(&server)).unwrap();
        let result = client
            .complete_structured::<Verdict>("Judge the request.", "Approve this?")
            .await;

        assert!(matches!(result, Err(ScoutError::SchemaValidation(_))));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_provider_error_is_retried_then_falls_over() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = LLMClient::new(openai_config(&server)).unwrap();
        let result = client
            .complete_structured::<Verdict>("Judge the request.", "Approve this?")
            .await;

        assert!(matches!(result, Err(ScoutError::Collaborator(_))));
        // 主模型3次，备选模型3次
        assert_eq!(server.received_requests().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_submit_tool_call_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "submit", "arguments": "{\"approved\": true}"}
                }]
            }))))
            .mount(&server)
            .await;

        let client = LLMClient::new(openai_config(&server)).unwrap();
        let verdict = client
            .complete_structured::<Verdict>("Judge the request.", "Approve this?")
            .await
            .unwrap();

        assert!(verdict.approved);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[test]
    fn test_client_creation_for_each_provider() {
        for provider in [
            LLMProvider::OpenAI,
            LLMProvider::OpenRouter,
            LLMProvider::DeepSeek,
            LLMProvider::Ollama,
        ] {
            let config = LLMConfig {
                provider,
                api_key: "sk-test".to_string(),
                ..Default::default()
            };
            assert!(LLMClient::new(config).is_ok());
        }
    }
}
