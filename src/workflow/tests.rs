#[cfg(test)]
mod tests {
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::config::Config;
    use crate::error::ScoutError;
    use crate::testing::{ScriptedLanguageModel, ScriptedWebSearch};
    use crate::types::{PricingModel, TriState};
    use crate::workflow::stages::{extraction, recommendation};
    use crate::workflow::{
        NO_TOOLS_FOUND_MESSAGE, TimingScope, Workflow, WorkflowContext, WorkflowState,
    };

    const SUFFIX: &str = "official site";

    fn test_config() -> Config {
        let mut config = Config::default();
        config.pipeline.gather_articles = false;
        config.pipeline.synthesis_retry_delay_ms = 0;
        config
    }

    fn build(
        llm: ScriptedLanguageModel,
        search: ScriptedWebSearch,
        config: Config,
    ) -> (
        Workflow<ScriptedLanguageModel, ScriptedWebSearch>,
        Arc<ScriptedLanguageModel>,
        Arc<ScriptedWebSearch>,
    ) {
        let llm = Arc::new(llm);
        let search = Arc::new(search);
        let context = WorkflowContext::new(llm.clone(), search.clone(), config);
        (Workflow::new(context), llm, search)
    }

    fn scripted_llm(names: &'static str) -> ScriptedLanguageModel {
        ScriptedLanguageModel::new()
            .on_complete(extraction::SYSTEM_PROMPT, move |_| Ok(names.to_string()))
            .on_complete(recommendation::SYSTEM_PROMPT, |_| {
                Ok("Pick the first one.".to_string())
            })
            .on_structured(|_| {
                Ok(json!({
                    "pricing_model": "Free",
                    "is_open_source": true,
                    "tech_stack": ["Rust"],
                    "description": "A developer tool."
                }))
            })
    }

    fn three_tools() -> ScriptedWebSearch {
        ScriptedWebSearch::new()
            .with_tool("Alpha", SUFFIX, "https://alpha.dev", "# Alpha")
            .with_tool("Beta", SUFFIX, "https://beta.dev", "# Beta")
            .with_tool("Gamma", SUFFIX, "https://gamma.dev", "# Gamma")
    }

    #[tokio::test]
    async fn test_full_run_produces_records_in_candidate_order() {
        let (workflow, llm, _) = build(
            scripted_llm("Alpha\nBeta\nGamma"),
            three_tools(),
            test_config(),
        );

        let result = workflow.run("  feature flag services ").await.unwrap();

        assert_eq!(result.query(), "feature flag services");
        let names: Vec<_> = result.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
        assert!(result.tools().iter().all(|t| t.pricing_model == PricingModel::Free));
        assert!(!result.analysis().is_empty());
        assert_eq!(llm.completion_count_for(recommendation::SYSTEM_PROMPT), 1);
    }

    #[tokio::test]
    async fn test_result_length_never_exceeds_cap() {
        let mut config = test_config();
        config.pipeline.max_candidates = 2;
        let (workflow, _, search) = build(
            scripted_llm("Alpha\nBeta\nGamma\nDelta\nEpsilon"),
            three_tools(),
            config,
        );

        let result = workflow.run("feature flags").await.unwrap();

        assert!(result.tools().len() <= 2);
        assert_eq!(search.search_count(), 2);
    }

    #[tokio::test]
    async fn test_blank_query_is_invalid_input() {
        let (workflow, llm, search) = build(scripted_llm("Alpha"), three_tools(), test_config());

        for query in ["", "   ", "\n\t"] {
            let err = workflow.run(query).await.unwrap_err();
            assert!(matches!(err, ScoutError::InvalidInput(_)));
        }
        assert_eq!(llm.completion_count(), 0);
        assert_eq!(search.search_count(), 0);
    }

    #[tokio::test]
    async fn test_candidates_deduplicated_case_insensitively() {
        let (workflow, _, _) = build(
            scripted_llm("Docker\ndocker\nDOCKER"),
            ScriptedWebSearch::new(),
            test_config(),
        );

        let state = workflow
            .step(WorkflowState::new("containers"))
            .await
            .unwrap();

        match state {
            WorkflowState::Researching { candidates, .. } => {
                assert_eq!(candidates.as_slice(), &["Docker".to_string()]);
            }
            other => panic!("expected researching state, got {:?}", other.phase_name()),
        }
    }

    #[tokio::test]
    async fn test_fetch_failures_degrade_to_unknown_records() {
        // Beta没有搜索结果，Gamma有结果但抓取失败
        let search = ScriptedWebSearch::new()
            .with_tool("Alpha", SUFFIX, "https://alpha.dev", "# Alpha")
            .with_hit("Gamma official site", "https://gamma.dev");
        let (workflow, llm, _) = build(scripted_llm("Alpha\nBeta\nGamma"), search, test_config());

        let result = workflow.run("anything").await.unwrap();
        let tools = result.tools();

        assert_eq!(tools.len(), 3);
        assert!(!tools[0].is_degraded());
        assert!(tools[1].is_degraded());
        assert!(tools[1].website.is_none());
        assert!(tools[2].is_degraded());
        assert_eq!(llm.structured_count(), 1);
        assert_eq!(llm.completion_count_for(recommendation::SYSTEM_PROMPT), 1);
    }

    #[tokio::test]
    async fn test_reversed_completion_order_keeps_candidate_order() {
        let search = three_tools()
            .with_delay("https://alpha.dev", Duration::from_millis(30))
            .with_delay("https://beta.dev", Duration::from_millis(20))
            .with_delay("https://gamma.dev", Duration::from_millis(10));
        let (workflow, _, search) = build(scripted_llm("Alpha\nBeta\nGamma"), search, test_config());

        let result = workflow.run("anything").await.unwrap();

        assert_eq!(
            search.scrape_order(),
            vec!["https://gamma.dev", "https://beta.dev", "https://alpha.dev"]
        );
        let names: Vec<_> = result.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[tokio::test]
    async fn test_empty_candidates_short_circuit_without_downstream_calls() {
        let (workflow, llm, search) = build(
            scripted_llm("<think>none of these are real</think>\n\n"),
            three_tools(),
            test_config(),
        );

        let result = workflow.run("something obscure").await.unwrap();

        assert!(result.tools().is_empty());
        assert_eq!(result.analysis(), NO_TOOLS_FOUND_MESSAGE);
        assert_eq!(search.search_count(), 0);
        assert_eq!(search.scrape_count(), 0);
        assert_eq!(llm.structured_count(), 0);
        assert_eq!(llm.completion_count_for(recommendation::SYSTEM_PROMPT), 0);
    }

    #[tokio::test]
    async fn test_extraction_failure_yields_no_tools_result() {
        let llm = ScriptedLanguageModel::new().on_complete(extraction::SYSTEM_PROMPT, |_| {
            Err(ScoutError::Collaborator("model offline".to_string()))
        });
        let (workflow, _, search) = build(llm, three_tools(), test_config());

        let result = workflow.run("ci tools").await.unwrap();

        assert!(result.tools().is_empty());
        assert_eq!(result.analysis(), NO_TOOLS_FOUND_MESSAGE);
        assert_eq!(search.search_count(), 0);
    }

    #[tokio::test]
    async fn test_structured_failure_only_affects_its_own_candidate() {
        let llm = ScriptedLanguageModel::new()
            .on_complete(extraction::SYSTEM_PROMPT, |_| {
                Ok("Alpha\nBeta\nGamma".to_string())
            })
            .on_complete(recommendation::SYSTEM_PROMPT, |_| Ok("ok".to_string()))
            .on_structured(|prompt| {
                if prompt.contains("Company/Tool: Beta") {
                    Ok(json!({"pricing_model": 42}))
                } else {
                    Ok(json!({"pricing_model": "Paid", "has_api": true}))
                }
            });
        let (workflow, llm, _) = build(llm, three_tools(), test_config());

        let result = workflow.run("anything").await.unwrap();
        let tools = result.tools();

        assert_eq!(tools[0].has_api, TriState::Yes);
        assert_eq!(tools[2].pricing_model, PricingModel::Paid);
        assert!(tools[1].is_degraded());
        assert_eq!(tools[1].website.as_deref(), Some("https://beta.dev"));
        // Beta共尝试两次
        assert_eq!(llm.structured_count(), 4);
    }

    #[tokio::test]
    async fn test_page_content_is_truncated_before_analysis() {
        let mut config = test_config();
        config.pipeline.max_content_chars = 100;
        let search = ScriptedWebSearch::new().with_tool(
            "Alpha",
            SUFFIX,
            "https://alpha.dev",
            &"x".repeat(20_000),
        );
        let (workflow, llm, _) = build(scripted_llm("Alpha"), search, config);

        workflow.run("anything").await.unwrap();

        let prompts = llm.structured_prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].len() < 2_000);
    }

    #[tokio::test]
    async fn test_synthesis_failure_returns_fallback_text() {
        let llm = ScriptedLanguageModel::new()
            .on_complete(extraction::SYSTEM_PROMPT, |_| Ok("Alpha\nBeta".to_string()))
            .on_complete(recommendation::SYSTEM_PROMPT, |_| {
                Err(ScoutError::Timeout(Duration::from_secs(1)))
            })
            .on_structured(|_| Ok(json!({})));
        let (workflow, llm, _) = build(llm, three_tools(), test_config());

        let result = workflow.run("anything").await.unwrap();

        assert!(result.analysis().contains("https://alpha.dev"));
        assert!(result.analysis().contains("Beta"));
        assert_eq!(llm.completion_count_for(recommendation::SYSTEM_PROMPT), 3);
    }

    #[tokio::test]
    async fn test_article_context_is_sent_to_extraction() {
        let mut config = test_config();
        config.pipeline.gather_articles = true;
        config.pipeline.article_excerpt_chars = 20;
        let search = ScriptedWebSearch::new()
            .with_hit(
                "ci tools tools comparison best alternatives",
                "https://blog.example/ci",
            )
            .with_page(
                "https://blog.example/ci",
                "Jenkins vs Buildkite and a long tail that gets cut off",
            );
        let (workflow, llm, _) = build(scripted_llm("Jenkins"), search, config);

        workflow
            .step(WorkflowState::new("ci tools"))
            .await
            .unwrap();

        let prompt = llm.last_prompt_for(extraction::SYSTEM_PROMPT).unwrap();
        assert!(prompt.contains("Jenkins vs Buildkite"));
        assert!(!prompt.contains("long tail"));
    }

    #[tokio::test]
    async fn test_manual_stepping_can_stop_between_stages() {
        let (workflow, llm, search) = build(
            scripted_llm("Alpha\nBeta"),
            three_tools(),
            test_config(),
        );

        let state = workflow.step(WorkflowState::new("anything")).await.unwrap();
        assert_eq!(state.phase_name(), "researching");
        let state = workflow.step(state).await.unwrap();
        assert_eq!(state.phase_name(), "analyzing");
        drop(state);

        assert_eq!(search.scrape_count(), 2);
        assert_eq!(llm.structured_count(), 0);
        assert_eq!(llm.completion_count_for(recommendation::SYSTEM_PROMPT), 0);
    }

    #[tokio::test]
    async fn test_done_state_is_terminal() {
        let (workflow, _, _) = build(scripted_llm(""), three_tools(), test_config());

        let state = workflow.step(WorkflowState::new("anything")).await.unwrap();
        assert!(state.is_done());
        let state = workflow.step(state).await.unwrap();
        assert!(state.is_done());
    }

    #[test]
    fn test_timing_scope_records_phases_in_order() {
        let mut timing = TimingScope::new();
        timing.start_phase("extracting");
        timing.end_phase("extracting");
        timing.start_phase("researching");
        timing.end_phase("researching");

        let phases: Vec<_> = timing
            .phase_durations()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(phases, vec!["extracting", "researching"]);
        assert!(timing.end_phase("unknown").is_none());
        assert!(timing.generate_timing_report().contains("researching"));
    }
}
