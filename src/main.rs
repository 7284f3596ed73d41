use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use toolscout::cli::{self, display};
use toolscout::llm::LLMClient;
use toolscout::search::FirecrawlClient;
use toolscout::workflow::{Workflow, WorkflowContext};

type ProductionWorkflow = Workflow<LLMClient, FirecrawlClient>;

/// 初始化日志：输出到stderr，可选同时写入日志文件
fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,toolscout={}", default_level)));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {:?}", parent))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(file_layer)
        .init();
    Ok(())
}

/// 执行一次调研并输出结果
async fn research(workflow: &ProductionWorkflow, query: &str, json: bool) -> Result<()> {
    let result = workflow.run(query).await?;
    if json {
        println!("{}", display::render_json(&result)?);
    } else {
        print!("{}", display::render_result(&result));
    }
    Ok(())
}

/// 交互模式：逐行读取查询，直到quit/exit或输入结束
async fn interactive(workflow: &ProductionWorkflow, json: bool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\n🔍 Developer Tools Query: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if matches!(query.to_lowercase().as_str(), "quit" | "exit") {
            break;
        }
        if query.is_empty() {
            tracing::warn!("⚠️ 查询为空，已跳过");
            continue;
        }

        tracing::info!("📋 处理查询: '{}'", query);
        research(workflow, query, json).await?;
    }

    tracing::info!("👋 再见");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = cli::Args::parse();
    let config = args.into_config()?;
    init_tracing(config.verbose, config.log_file.as_deref())?;

    config.validate()?;

    let context = WorkflowContext::from_config(config)?;
    if !args.skip_connection_check {
        context.llm.check_connection().await?;
    }
    let workflow = Workflow::new(context);

    match args.query.as_deref() {
        Some(query) => research(&workflow, query, args.json).await,
        None => interactive(&workflow, args.json).await,
    }
}
