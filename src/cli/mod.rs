use crate::config::{Config, LLMProvider};
use crate::generator::outlet::ReportOptions;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::warn;

/// magi-rs - 多步骤调研智能体
#[derive(Parser, Debug)]
#[command(name = "magi-rs")]
#[command(
    about = "Research agent: plans web searches for a question, summarizes every source in parallel, drafts a cited answer and fact-checks it against the sources."
)]
#[command(version)]
pub struct Args {
    /// 要调研的问题
    pub question: String,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 报告输出文件，缺省时输出到标准输出
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// 在报告中附上审校反馈
    #[arg(long)]
    pub show_feedback: bool,

    /// 在报告中附上各阶段耗时
    #[arg(long)]
    pub show_timing: bool,

    /// 快速模型，用于查询规划和网页摘要
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 推理模型，用于撰写答案和事实核查
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// LLM Provider (openai, deepseek, openrouter, anthropic, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 搜索服务 API KEY
    #[arg(long)]
    pub search_api_key: Option<String>,

    /// 每个查询最多使用的搜索结果数
    #[arg(long)]
    pub max_results: Option<usize>,

    /// 并行调研分支的并发上限
    #[arg(long)]
    pub max_parallels: Option<usize>,

    /// 整体运行截止时间（秒）
    #[arg(long)]
    pub run_timeout: Option<u64>,

    /// 单个调研分支失败时排除该分支继续执行
    #[arg(long)]
    pub tolerate_branch_failures: bool,
}

impl Args {
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            include_feedback: self.show_feedback,
            include_timing: self.show_timing,
        }
    }

    /// 未设置 RUST_LOG 时使用的日志级别
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// 将CLI参数叠加到配置文件之上
    pub fn into_config(self) -> Result<Config> {
        let mut config = Config::load(self.config.as_ref())?;

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            match provider_str.parse::<LLMProvider>() {
                Ok(provider) => config.llm.provider = provider,
                Err(_) => warn!(
                    provider = %provider_str,
                    fallback = %config.llm.provider,
                    "unknown LLM provider, keeping the configured one"
                ),
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model_efficient) = self.model_efficient {
            config.llm.model_efficient = model_efficient;
        }
        if let Some(model_powerful) = self.model_powerful {
            config.llm.model_powerful = model_powerful;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }

        // 搜索与调研配置
        if let Some(search_api_key) = self.search_api_key {
            config.search.api_key = search_api_key;
        }
        if let Some(max_results) = self.max_results {
            config.research.max_results_per_query = max_results;
        }
        if let Some(max_parallels) = self.max_parallels {
            config.research.max_parallels = max_parallels;
        }
        if let Some(run_timeout) = self.run_timeout {
            config.research.run_timeout_seconds = Some(run_timeout);
        }
        if self.tolerate_branch_failures {
            config.research.tolerate_branch_failures = true;
        }

        Ok(config)
    }
}
