#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use crate::config::LLMProvider;
    use clap::Parser;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_args_default_values() {
        let args = Args::try_parse_from(["toolscout"]).unwrap();

        assert!(args.query.is_none());
        assert!(args.config.is_none());
        assert!(!args.no_articles);
        assert!(!args.json);
        assert!(!args.verbose);
        assert!(!args.skip_connection_check);
    }

    #[test]
    fn test_args_positional_query_and_short_options() {
        let args = Args::try_parse_from([
            "toolscout",
            "feature flag services",
            "-c",
            "/tmp/scout.toml",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.query.as_deref(), Some("feature flag services"));
        assert_eq!(args.config, Some(PathBuf::from("/tmp/scout.toml")));
        assert!(args.verbose);
    }

    #[test]
    fn test_args_override_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("toolscout.toml");
        std::fs::write(
            &config_path,
            "[llm]\nmodel_efficient = \"from-file\"\n\n[pipeline]\nmax_candidates = 8\n",
        )
        .unwrap();

        let args = Args::try_parse_from([
            "toolscout",
            "--config",
            config_path.to_str().unwrap(),
            "--llm-provider",
            "ollama",
            "--model-powerful",
            "big-model",
            "--max-candidates",
            "3",
            "--max-parallels",
            "2",
            "--firecrawl-api-key",
            "fc-cli",
            "--no-articles",
            "--log-file",
            "scout.log",
        ])
        .unwrap();
        let config = args.into_config().unwrap();

        assert_eq!(config.llm.provider, LLMProvider::Ollama);
        assert_eq!(config.llm.model_efficient, "from-file");
        assert_eq!(config.llm.model_powerful, "big-model");
        assert_eq!(config.llm.max_parallels, 2);
        assert_eq!(config.search.api_key, "fc-cli");
        assert_eq!(config.pipeline.max_candidates, 3);
        assert!(!config.pipeline.gather_articles);
        assert_eq!(config.log_file, Some(PathBuf::from("scout.log")));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let args = Args::try_parse_from(["toolscout", "--llm-provider", "skynet"]).unwrap();
        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args =
            Args::try_parse_from(["toolscout", "--config", "/nonexistent/toolscout.toml"]).unwrap();
        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_invalid_numeric_flag_fails_to_parse() {
        assert!(Args::try_parse_from(["toolscout", "--max-candidates", "many"]).is_err());
    }
}
