use anyhow::Result;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::ResearchError;
use crate::generator::context::GeneratorContext;
use crate::generator::prompts;

/// 查询数不足时最多规划的次数（含首次）
const PLANNING_ATTEMPTS: usize = 2;

/// 查询规划器：把用户问题拆成若干条覆盖不同方面的搜索查询
#[derive(Default)]
pub struct QueryPlanner;

impl QueryPlanner {
    pub async fn execute(&self, context: &GeneratorContext, user_input: &str) -> Result<Vec<String>> {
        context.progress.report(10, "Generating search queries...");

        let research = &context.config.research;
        let user_prompt =
            prompts::plan_queries(user_input, research.min_queries, research.max_queries);

        // 不足下限时再规划一次，与已有查询合并去重
        let mut collected = Vec::new();
        let mut queries = Vec::new();
        for attempt in 1..=PLANNING_ATTEMPTS {
            let planned = context
                .generator
                .plan_queries(prompts::SYSTEM, &user_prompt)
                .await?;
            collected.extend(planned.queries);
            queries = normalize_queries(collected.clone(), research.max_queries);
            if queries.len() >= research.min_queries {
                break;
            }
            debug!(attempt, planned = queries.len(), "too few search queries");
        }

        if queries.is_empty() {
            return Err(ResearchError::NoQueries.into());
        }
        if queries.len() < research.min_queries {
            warn!(
                planned = queries.len(),
                expected = research.min_queries,
                "fewer search queries than requested, continuing"
            );
        }

        info!(count = queries.len(), "search queries planned");
        Ok(queries)
    }
}

/// 去掉空白与重复（忽略大小写）的查询，保留首次出现的顺序，最多保留 `max_queries` 条
pub fn normalize_queries(raw: Vec<String>, max_queries: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .filter(|q| seen.insert(q.to_lowercase()))
        .take(max_queries)
        .collect()
}
