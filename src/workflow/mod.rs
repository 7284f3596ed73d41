//! 调研流程控制器
//!
//! 四个阶段严格按顺序执行：提取候选 → 检索页面 → 结构化分析 → 汇总推荐。
//! 每次`step`只推进一个状态，调用方可以在任意两个阶段之间停止。

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::Instrument;
use uuid::Uuid;

use crate::error::ScoutResult;
use crate::llm::LanguageModel;
use crate::search::WebSearch;
use crate::types::{CandidateNames, PageContent, RecommendationResult, ToolRecord, validate_query};

pub mod context;
pub mod stages;

pub use context::WorkflowContext;
pub use stages::recommendation::NO_TOOLS_FOUND_MESSAGE;

/// 阶段计时
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: HashMap<String, Instant>,
    phase_durations: Vec<(String, Duration)>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: HashMap::new(),
            phase_durations: Vec::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &str) {
        self.phase_start_times
            .insert(phase_name.to_string(), Instant::now());
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, phase_name: &str) -> Option<Duration> {
        let duration = self.phase_start_times.remove(phase_name)?.elapsed();
        self.phase_durations
            .push((phase_name.to_string(), duration));
        Some(duration)
    }

    pub fn total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 按执行顺序排列的各阶段耗时
    pub fn phase_durations(&self) -> &[(String, Duration)] {
        &self.phase_durations
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "总执行时间: {:.2}秒\n",
            self.total_duration().as_secs_f64()
        );

        if !self.phase_durations.is_empty() {
            report.push_str("各阶段执行时间:\n");
            for (phase, duration) in &self.phase_durations {
                report.push_str(&format!("- {}: {:.3}秒\n", phase, duration.as_secs_f64()));
            }
        }

        report
    }
}

/// 调研流程的状态
#[derive(Debug, Clone)]
pub enum WorkflowState {
    Extracting {
        query: String,
    },
    Researching {
        query: String,
        candidates: CandidateNames,
    },
    Analyzing {
        query: String,
        candidates: CandidateNames,
        pages: HashMap<String, Option<PageContent>>,
    },
    Recommending {
        query: String,
        records: Vec<ToolRecord>,
    },
    Done(RecommendationResult),
}

impl WorkflowState {
    /// 初始状态
    pub fn new(query: impl Into<String>) -> Self {
        WorkflowState::Extracting {
            query: query.into(),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, WorkflowState::Done(_))
    }

    pub fn phase_name(&self) -> &'static str {
        match self {
            WorkflowState::Extracting { .. } => "extracting",
            WorkflowState::Researching { .. } => "researching",
            WorkflowState::Analyzing { .. } => "analyzing",
            WorkflowState::Recommending { .. } => "recommending",
            WorkflowState::Done(_) => "done",
        }
    }
}

/// 调研流程
pub struct Workflow<L, S> {
    context: WorkflowContext<L, S>,
}

impl<L, S> Workflow<L, S>
where
    L: LanguageModel,
    S: WebSearch,
{
    pub fn new(context: WorkflowContext<L, S>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &WorkflowContext<L, S> {
        &self.context
    }

    /// 执行一次状态转移
    ///
    /// 只有提取阶段的`InvalidInput`会返回错误；`Done`状态原样返回。
    pub async fn step(&self, state: WorkflowState) -> ScoutResult<WorkflowState> {
        let context = &self.context;

        let next = match state {
            WorkflowState::Extracting { query } => {
                let query = validate_query(&query)?.to_string();
                let candidates = stages::extraction::extract_candidates(context, &query).await?;
                if candidates.is_empty() {
                    tracing::warn!("⚠️ 没有找到候选工具，提前结束");
                    WorkflowState::Done(RecommendationResult::new(
                        query,
                        Vec::new(),
                        NO_TOOLS_FOUND_MESSAGE,
                    ))
                } else {
                    WorkflowState::Researching { query, candidates }
                }
            }
            WorkflowState::Researching { query, candidates } => {
                let pages = stages::research::fetch_pages(context, &candidates).await;
                WorkflowState::Analyzing {
                    query,
                    candidates,
                    pages,
                }
            }
            WorkflowState::Analyzing {
                query,
                candidates,
                pages,
            } => {
                let records = stages::analysis::analyze_all(context, &candidates, &pages).await;
                WorkflowState::Recommending { query, records }
            }
            WorkflowState::Recommending { query, records } => {
                let analysis =
                    stages::recommendation::synthesize(context, &query, &records).await;
                WorkflowState::Done(RecommendationResult::new(query, records, analysis))
            }
            done @ WorkflowState::Done(_) => done,
        };

        Ok(next)
    }

    /// 从提取阶段一直执行到完成
    pub async fn run(&self, query: &str) -> ScoutResult<RecommendationResult> {
        let span = tracing::info_span!("research", run_id = %Uuid::new_v4());
        self.drive(query).instrument(span).await
    }

    async fn drive(&self, query: &str) -> ScoutResult<RecommendationResult> {
        tracing::info!("🚀 开始调研: {}", query);
        let mut timing = TimingScope::new();
        let mut state = WorkflowState::new(query);

        loop {
            if let WorkflowState::Done(result) = state {
                tracing::info!(
                    "🎉 调研完成，共分析 {} 个工具\n{}",
                    result.tools().len(),
                    timing.generate_timing_report()
                );
                return Ok(result);
            }

            let phase = state.phase_name();
            timing.start_phase(phase);
            state = self.step(state).await?;
            timing.end_phase(phase);
        }
    }
}

// Include tests
#[cfg(test)]
mod tests;
