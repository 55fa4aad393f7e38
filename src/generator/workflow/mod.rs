use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{Instrument, info, info_span, warn};

use crate::config::Config;
use crate::error::ResearchError;
use crate::generator::composer::{DraftComposer, build_references};
use crate::generator::context::GeneratorContext;
use crate::generator::dispatcher::{WorkItem, dispatch};
use crate::generator::planner::QueryPlanner;
use crate::generator::progress::ProgressSink;
use crate::generator::researcher::Researcher;
use crate::generator::reviewer::Reviewer;
use crate::generator::state::{ResultSet, RunState};
use crate::llm::LLMClient;
use crate::search::{SearchClient, create_search_client};
use crate::utils::threads::do_parallel_with_limit;

/// 调研分支推进时进度条的起止百分比
const RESEARCH_PROGRESS_START: u8 = 20;
const RESEARCH_PROGRESS_END: u8 = 65;

/// 时间跟踪作用域
#[derive(Debug, Clone)]
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
        let start_time = self.phase_start_times.remove(phase_name)?;
        let duration = start_time.elapsed();
        self.phase_durations
            .push((phase_name.to_string(), duration));
        Some(duration)
    }

    pub fn get_total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 按阶段结束的先后顺序返回耗时
    pub fn get_phase_durations(&self) -> &[(String, Duration)] {
        &self.phase_durations
    }

    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "Total: {:.2}s\n",
            self.get_total_duration().as_secs_f64()
        );
        for (phase, duration) in &self.phase_durations {
            report.push_str(&format!("- {}: {:.3}s\n", phase, duration.as_secs_f64()));
        }
        report
    }
}

/// 阶段名称
pub struct TimingKeys;

impl TimingKeys {
    pub const PLAN: &'static str = "plan";
    pub const RESEARCH: &'static str = "research";
    pub const COMPOSE: &'static str = "compose";
    pub const REVIEW: &'static str = "review";
}

/// 按配置创建真实的服务并执行一次完整的调研
pub async fn launch(
    config: &Config,
    user_input: &str,
    progress: Arc<dyn ProgressSink>,
) -> Result<RunState> {
    let llm_client = LLMClient::new(config.llm.clone())?;
    // 启动时检查模型连接
    llm_client.check_connection().await?;
    let search: Arc<dyn SearchClient> = Arc::from(create_search_client(&config.search)?);

    let context =
        GeneratorContext::with_services(config.clone(), Arc::new(llm_client), search, progress);
    execute(&context, user_input).await
}

/// 执行调研工作流：规划 -> 并行调研 -> 撰写 -> 审校
///
/// 要么返回包含最终答案的状态，要么在产出任何答案之前失败。
pub async fn execute(context: &GeneratorContext, user_input: &str) -> Result<RunState> {
    let user_input = user_input.trim();
    if user_input.is_empty() {
        return Err(ResearchError::EmptyQuestion.into());
    }

    let state = RunState::new(user_input);
    let span = info_span!("research_run", run_id = %state.run_id);

    let run = run_graph(context, state).instrument(span);
    match context.config.research.run_timeout_seconds {
        Some(seconds) => tokio::time::timeout(Duration::from_secs(seconds), run)
            .await
            .map_err(|_| ResearchError::RunTimedOut { seconds })?,
        None => run.await,
    }
}

async fn run_graph(context: &GeneratorContext, mut state: RunState) -> Result<RunState> {
    info!(question = state.user_input(), "research run started");

    state.timing.start_phase(TimingKeys::PLAN);
    state.queries = QueryPlanner.execute(context, state.user_input()).await?;
    state.timing.end_phase(TimingKeys::PLAN);

    state.timing.start_phase(TimingKeys::RESEARCH);
    context
        .progress
        .report(RESEARCH_PROGRESS_START, "Initiating parallel searches...");
    let work_items = dispatch(&state.queries, state.user_input());
    state.partial_results = research_all(context, work_items).await?;
    state.timing.end_phase(TimingKeys::RESEARCH);

    state.timing.start_phase(TimingKeys::COMPOSE);
    let composition = DraftComposer
        .execute(context, state.user_input(), &state.partial_results)
        .await?;
    state.draft = composition.draft;
    state.composer_thinking = composition.thinking;
    state.references = composition.references;
    state.timing.end_phase(TimingKeys::COMPOSE);

    state.timing.start_phase(TimingKeys::REVIEW);
    let review = Reviewer
        .execute(
            context,
            state.user_input(),
            &state.draft,
            &state.partial_results,
        )
        .await?;
    state.final_output = review.final_output;
    state.review_feedback = review.feedback;
    state.reviewer_thinking = review.thinking;
    state.review = Some(review.verdict);
    // 修订稿可能增删或改动引用编号，参考文献以最终答案为准
    state.references = build_references(&state.final_output, &state.partial_results);
    state.timing.end_phase(TimingKeys::REVIEW);

    context
        .progress
        .report(100, "Research and review completed!");
    info!(
        queries = state.queries.len(),
        sources = state.partial_results.len(),
        elapsed_secs = state.timing.get_total_duration().as_secs_f64(),
        "research run finished"
    );
    Ok(state)
}

/// 并行执行所有调研分支，等待全部完成后合并结果
async fn research_all(context: &GeneratorContext, work_items: Vec<WorkItem>) -> Result<ResultSet> {
    let total = work_items.len();
    let completed = Arc::new(AtomicUsize::new(0));

    let branch_futures: Vec<_> = work_items
        .into_iter()
        .map(|item| {
            let completed = completed.clone();
            Box::pin(async move {
                let result = Researcher.execute(context, &item).await;
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                context.progress.report(
                    branch_progress(done, total),
                    &format!("Finished research {}/{}", done, total),
                );
                (item, result)
            })
        })
        .collect();

    let outcomes =
        do_parallel_with_limit(branch_futures, context.config.research.max_parallels).await;

    let tolerate = context.config.research.tolerate_branch_failures;
    let mut merged = ResultSet::new();
    let mut first_failure = None;
    let mut succeeded = 0;

    for (item, result) in outcomes {
        match result {
            Ok(branch) => {
                succeeded += 1;
                merged = merged.merge(branch);
            }
            Err(source) => {
                let failure = ResearchError::BranchFailed {
                    query: item.query,
                    source,
                };
                if !tolerate {
                    return Err(failure.into());
                }
                warn!("excluding failed research branch: {:#}", failure);
                first_failure.get_or_insert(failure);
            }
        }
    }

    if succeeded == 0
        && let Some(failure) = first_failure
    {
        return Err(failure.into());
    }

    info!(branches = total, results = merged.len(), "research results merged");
    Ok(merged)
}

fn branch_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return RESEARCH_PROGRESS_END;
    }
    let span = (RESEARCH_PROGRESS_END - RESEARCH_PROGRESS_START) as usize;
    RESEARCH_PROGRESS_START + (span * done.min(total) / total) as u8
}
