use anyhow::Result;
use tracing::{info, warn};

use crate::generator::context::GeneratorContext;
use crate::generator::prompts;
use crate::generator::state::ResultSet;
use crate::llm::GenerationRole;
use crate::llm::client::utils::split_reasoning;

/// 审校通过时模型应当原样回复的句子
pub const ACCEPTANCE_SENTENCE: &str =
    "The Final Response is coherent, accurate, and fully supported by the provided sources.";
pub const CORRECTION_OPEN: &str = "<CORRECTED_FINAL_RESPONSE>";
pub const CORRECTION_CLOSE: &str = "</CORRECTED_FINAL_RESPONSE>";
pub const UNEXPECTED_FORMAT_PREFIX: &str =
    "Reviewer generated unexpected format or direct feedback:\n";

/// 审校结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewVerdict {
    /// 回复中包含通过句，草稿原样保留
    Accepted,
    /// 回复中有完整的修订块，用修订内容替换草稿
    Corrected { feedback: String, corrected: String },
    /// 无法识别的格式，草稿原样保留，原始回复留作诊断
    Unrecognized { raw: String },
}

impl ReviewVerdict {
    /// 依次检查通过句、修订块，都不满足时回退
    ///
    /// 通过句只做精确的子串匹配，措辞或标点稍有不同就会落入回退分支。
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();

        if raw.contains(ACCEPTANCE_SENTENCE) {
            return ReviewVerdict::Accepted;
        }

        if let Some((before, after)) = raw.split_once(CORRECTION_OPEN)
            && let Some((block, _)) = after.split_once(CORRECTION_CLOSE)
        {
            let corrected = block.trim();
            if !corrected.is_empty() {
                return ReviewVerdict::Corrected {
                    feedback: before.trim().to_string(),
                    corrected: corrected.to_string(),
                };
            }
        }

        ReviewVerdict::Unrecognized {
            raw: raw.to_string(),
        }
    }

    pub fn feedback(&self) -> String {
        match self {
            ReviewVerdict::Accepted => ACCEPTANCE_SENTENCE.to_string(),
            ReviewVerdict::Corrected { feedback, .. } => feedback.clone(),
            ReviewVerdict::Unrecognized { raw } => format!("{}{}", UNEXPECTED_FORMAT_PREFIX, raw),
        }
    }

    pub fn final_output(&self, draft: &str) -> String {
        match self {
            ReviewVerdict::Corrected { corrected, .. } => corrected.clone(),
            ReviewVerdict::Accepted | ReviewVerdict::Unrecognized { .. } => draft.to_string(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReviewVerdict::Accepted => "accepted",
            ReviewVerdict::Corrected { .. } => "corrected",
            ReviewVerdict::Unrecognized { .. } => "unrecognized",
        }
    }
}

/// 审校阶段的产出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub verdict: ReviewVerdict,
    pub final_output: String,
    pub feedback: String,
    pub thinking: String,
}

/// 对照来源核查草稿，必要时给出修订版本
#[derive(Default)]
pub struct Reviewer;

impl Reviewer {
    pub async fn execute(
        &self,
        context: &GeneratorContext,
        user_input: &str,
        draft: &str,
        results: &ResultSet,
    ) -> Result<ReviewOutcome> {
        context
            .progress
            .report(90, "Reviewing and validating the response...");

        let summaries = format_summaries(results);
        let user_prompt = prompts::review(
            user_input,
            draft,
            &summaries,
            ACCEPTANCE_SENTENCE,
            CORRECTION_OPEN,
            CORRECTION_CLOSE,
        );

        let raw = context
            .generator
            .generate(GenerationRole::Review, prompts::SYSTEM, &user_prompt)
            .await?;
        let (thinking, content) = split_reasoning(&raw);

        let verdict = ReviewVerdict::parse(&content);
        match &verdict {
            ReviewVerdict::Unrecognized { .. } => {
                warn!("reviewer output did not match any known format, keeping the draft")
            }
            other => info!(verdict = other.label(), "review finished"),
        }

        Ok(ReviewOutcome {
            final_output: verdict.final_output(draft),
            feedback: verdict.feedback(),
            verdict,
            thinking,
        })
    }
}

pub fn format_summaries(results: &ResultSet) -> String {
    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!("Source [{}] - Title: {}\n", i + 1, result.title));
        out.push_str(&format!("Content Summary:\n{}\n", result.summary));
        out.push_str("-----------------\n");
    }
    out
}
