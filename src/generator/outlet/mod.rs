use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

use crate::generator::composer::render_references;
use crate::generator::state::RunState;

/// 报告渲染选项
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// 附上审校反馈
    pub include_feedback: bool,
    /// 附上各阶段耗时
    pub include_timing: bool,
}

/// 将完成的运行状态渲染为Markdown报告
pub fn render_report(state: &RunState, options: &ReportOptions) -> String {
    let mut report = format!(
        "# {}\n\n_Run {} started {}_\n\n",
        state.user_input(),
        state.run_id,
        state.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    report.push_str("## Generated Queries\n\n");
    for query in &state.queries {
        report.push_str(&format!("- {}\n", query));
    }

    report.push_str("\n## Final Research Report\n\n");
    report.push_str(state.final_output.trim());
    report.push_str("\n\nReferences:\n");
    report.push_str(&render_references(&state.references));

    if options.include_feedback && !state.review_feedback.is_empty() {
        report.push_str("\n## Reviewer Feedback\n\n");
        report.push_str(&state.review_feedback);
        report.push('\n');
    }

    if options.include_timing {
        report.push_str("\n## Timing\n\n");
        report.push_str(&state.timing.generate_timing_report());
    }

    report
}

#[allow(async_fn_in_trait)]
pub trait Outlet {
    async fn save(&self, report: &str) -> Result<()>;
}

/// 写入Markdown文件
pub struct DiskOutlet {
    path: PathBuf,
}

impl DiskOutlet {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Outlet for DiskOutlet {
    async fn save(&self, report: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .context(format!("Failed to create output directory: {:?}", parent))?;
        }
        fs::write(&self.path, report)
            .await
            .context(format!("Failed to write report: {:?}", self.path))?;
        info!(path = %self.path.display(), "report saved");
        Ok(())
    }
}

/// 输出到标准输出
pub struct StdoutOutlet;

impl Outlet for StdoutOutlet {
    async fn save(&self, report: &str) -> Result<()> {
        println!("{}", report);
        Ok(())
    }
}

/// 按输出路径选择保存位置
pub async fn save(state: &RunState, output: Option<PathBuf>, options: &ReportOptions) -> Result<()> {
    let report = render_report(state, options);
    match output {
        Some(path) => DiskOutlet::new(path).save(&report).await,
        None => StdoutOutlet.save(&report).await,
    }
}
