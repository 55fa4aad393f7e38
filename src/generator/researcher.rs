use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::generator::context::GeneratorContext;
use crate::generator::dispatcher::WorkItem;
use crate::generator::prompts;
use crate::generator::state::{ItemKey, ResultItem, ResultSet};
use crate::llm::GenerationRole;
use crate::llm::client::utils::split_reasoning;

/// 单个查询的调研者：搜索、提取正文、按问题摘要
#[derive(Default)]
pub struct Researcher;

impl Researcher {
    /// 返回该分支贡献的结果；提取不到正文的命中被跳过，其余错误直接向上传递
    pub async fn execute(&self, context: &GeneratorContext, item: &WorkItem) -> Result<ResultSet> {
        context.progress.message(&format!(
            "Searching and summarizing: '{}...'",
            preview(&item.query, 40)
        ));

        let max_results = context.config.research.max_results_per_query;
        let hits = context
            .search
            .search(&item.query, max_results)
            .await
            .with_context(|| format!("search failed for query '{}'", item.query))?;

        let mut results = ResultSet::new();
        for (rank, hit) in hits.into_iter().take(max_results).enumerate() {
            let Some(content) = context
                .search
                .extract(&hit.url)
                .await
                .with_context(|| format!("content extraction failed for {}", hit.url))?
            else {
                debug!(url = %hit.url, "no extractable content, skipping");
                continue;
            };

            let summary = self.summarize(context, &item.user_input, &content).await?;
            results.insert(
                ItemKey {
                    branch: item.branch,
                    rank,
                },
                ResultItem {
                    title: hit.title,
                    source_url: hit.url,
                    summary,
                },
            );
        }

        info!(query = %item.query, results = results.len(), "research branch finished");
        Ok(results)
    }

    async fn summarize(
        &self,
        context: &GeneratorContext,
        user_input: &str,
        page_content: &str,
    ) -> Result<String> {
        let user_prompt = prompts::summarize(user_input, page_content);
        let raw = context
            .generator
            .generate(GenerationRole::Summarize, prompts::SYSTEM, &user_prompt)
            .await?;
        let (_, summary) = split_reasoning(&raw);
        Ok(summary.trim().to_string())
    }
}

/// 截取前 `max_chars` 个字符用于进度展示
fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
