use crate::config::LLMConfig;

/// 短prompt交给高能效模型并以高质量模型兜底，长prompt直接使用高质量模型
pub fn evaluate_befitting_model(
    llm_config: &LLMConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> (String, Option<String>) {
    if system_prompt.len() + user_prompt.len() <= 32 * 1024 {
        let fallover = (llm_config.model_powerful != llm_config.model_efficient
            && !llm_config.model_powerful.is_empty())
        .then(|| llm_config.model_powerful.clone());
        return (llm_config.model_efficient.clone(), fallover);
    }
    (llm_config.model_powerful.clone(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_prompt_uses_efficient_model() {
        let config = LLMConfig {
            model_efficient: "small".to_string(),
            model_powerful: "large".to_string(),
            ..Default::default()
        };
        let (model, fallover) = evaluate_befitting_model(&config, "sys", "user");
        assert_eq!(model, "small");
        assert_eq!(fallover.as_deref(), Some("large"));
    }

    #[test]
    fn test_long_prompt_uses_powerful_model() {
        let config = LLMConfig {
            model_efficient: "small".to_string(),
            model_powerful: "large".to_string(),
            ..Default::default()
        };
        let long = "x".repeat(40 * 1024);
        let (model, fallover) = evaluate_befitting_model(&config, "sys", &long);
        assert_eq!(model, "large");
        assert!(fallover.is_none());
    }

    #[test]
    fn test_same_models_have_no_fallover() {
        let config = LLMConfig {
            model_efficient: "same".to_string(),
            model_powerful: "same".to_string(),
            ..Default::default()
        };
        let (_, fallover) = evaluate_befitting_model(&config, "sys", "user");
        assert!(fallover.is_none());
    }
}
