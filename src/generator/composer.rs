use anyhow::Result;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::error::ResearchError;
use crate::generator::context::GeneratorContext;
use crate::generator::prompts;
use crate::generator::state::{Reference, ResultSet};
use crate::llm::GenerationRole;
use crate::llm::client::utils::split_reasoning;

/// 匹配 `[3]` 以及 `[1, 4]` 这样的引用标记
static CITATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+(?:\s*,\s*\d+)*)\]").expect("valid citation regex"));

/// 撰写阶段的产出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    pub draft: String,
    pub thinking: String,
    pub references: Vec<Reference>,
}

/// 汇总全部调研结果撰写带引用的答案
#[derive(Default)]
pub struct DraftComposer;

impl DraftComposer {
    pub async fn execute(
        &self,
        context: &GeneratorContext,
        user_input: &str,
        results: &ResultSet,
    ) -> Result<Composition> {
        context.progress.report(70, "Compiling final response...");
        if results.is_empty() {
            warn!("composing without any research results");
        }

        let search_results = format_sources(results);
        let user_prompt = prompts::compose(user_input, &search_results);

        let raw = context
            .generator
            .generate(GenerationRole::Compose, prompts::SYSTEM, &user_prompt)
            .await?;
        let (thinking, content) = split_reasoning(&raw);
        let draft = content.trim().to_string();
        if draft.is_empty() {
            return Err(ResearchError::EmptyDraft.into());
        }

        let references = build_references(&draft, results);
        info!(
            words = draft.split_whitespace().count(),
            references = references.len(),
            "draft composed"
        );

        Ok(Composition {
            draft,
            thinking,
            references,
        })
    }
}

/// 按合并后的迭代顺序编号，第 i 条结果即引用 `[i]`
pub fn format_sources(results: &ResultSet) -> String {
    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!("[{}]\n\n", i + 1));
        out.push_str(&format!("Title: {}\n", result.title));
        out.push_str(&format!("URL: {}\n", result.source_url));
        out.push_str(&format!("Content: {}\n", result.summary));
        out.push_str("================\n\n");
    }
    out
}

/// 草稿中实际出现、且能对应到某条结果的引用编号
pub fn cited_indices(draft: &str, available: usize) -> BTreeSet<usize> {
    CITATION_PATTERN
        .captures_iter(draft)
        .flat_map(|cap| {
            cap[1]
                .split(',')
                .filter_map(|n| n.trim().parse::<usize>().ok())
                .collect::<Vec<_>>()
        })
        .filter(|i| (1..=available).contains(i))
        .collect()
}

/// 为每个被引用的编号生成一条参考文献
pub fn build_references(draft: &str, results: &ResultSet) -> Vec<Reference> {
    cited_indices(draft, results.len())
        .into_iter()
        .filter_map(|index| {
            results.get_cited(index).map(|item| Reference {
                index,
                title: item.title.clone(),
                url: item.source_url.clone(),
            })
        })
        .collect()
}

pub fn render_references(references: &[Reference]) -> String {
    references
        .iter()
        .map(|r| format!("[{}] - [{}]({})\n", r.index, r.title, r.url))
        .collect()
}
