//! 单元测试使用的内存版协作方

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::Config;
use crate::generator::context::GeneratorContext;
use crate::generator::progress::tests::RecordingProgress;
use crate::llm::{GenerationRole, Generator, QueryList};
use crate::search::{SearchClient, SearchHit};

/// 按用途返回预设文本的生成器
#[derive(Default)]
pub(crate) struct ScriptedGenerator {
    pub queries: Vec<String>,
    pub draft: String,
    pub review: String,
    /// 第二次及以后的规划返回的查询，为空时沿用 `queries`
    pub replanned_queries: Vec<String>,
    pub calls: Mutex<Vec<(GenerationRole, String)>>,
    pub planned: Mutex<usize>,
}

impl ScriptedGenerator {
    pub fn plan_calls(&self) -> usize {
        *self.planned.lock().unwrap()
    }

    pub fn prompts_for(&self, role: GenerationRole) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

/// 取出摘要提示词里的网页正文
fn page_content(prompt: &str) -> &str {
    prompt
        .split_once("<SEARCH_RESULTS>\n")
        .and_then(|(_, rest)| rest.split_once("\n</SEARCH_RESULTS>"))
        .map(|(content, _)| content)
        .unwrap_or("")
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        role: GenerationRole,
        _system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((role, user_prompt.to_string()));
        Ok(match role {
            GenerationRole::Summarize => format!("summary of {}", page_content(user_prompt)),
            GenerationRole::Compose => self.draft.clone(),
            GenerationRole::Review => self.review.clone(),
        })
    }

    async fn plan_queries(&self, _system_prompt: &str, _user_prompt: &str) -> Result<QueryList> {
        let mut planned = self.planned.lock().unwrap();
        *planned += 1;
        let queries = if *planned > 1 && !self.replanned_queries.is_empty() {
            self.replanned_queries.clone()
        } else {
            self.queries.clone()
        };
        Ok(QueryList { queries })
    }
}

/// 固定命中与网页内容的搜索服务
#[derive(Default)]
pub(crate) struct StaticSearch {
    /// 查询 -> 命中
    pub hits: HashMap<String, Vec<SearchHit>>,
    /// 地址 -> 正文，缺失表示提取不到内容
    pub pages: HashMap<String, String>,
    pub failing_queries: HashSet<String>,
    /// 查询 -> 人为延迟（毫秒），用来打乱分支完成顺序
    pub delays_ms: HashMap<String, u64>,
}

impl StaticSearch {
    pub fn with_page(mut self, query: &str, title: &str, url: &str, content: Option<&str>) -> Self {
        self.hits.entry(query.to_string()).or_default().push(SearchHit {
            title: title.to_string(),
            url: url.to_string(),
        });
        if let Some(content) = content {
            self.pages.insert(url.to_string(), content.to_string());
        }
        self
    }
}

#[async_trait]
impl SearchClient for StaticSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        if let Some(ms) = self.delays_ms.get(query) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        if self.failing_queries.contains(query) {
            return Err(anyhow!("search service unavailable for '{}'", query));
        }
        Ok(self
            .hits
            .get(query)
            .map(|hits| hits.iter().take(max_results).cloned().collect())
            .unwrap_or_default())
    }

    async fn extract(&self, url: &str) -> Result<Option<String>> {
        Ok(self.pages.get(url).cloned())
    }
}

pub(crate) fn test_context(
    config: Config,
    generator: Arc<ScriptedGenerator>,
    search: StaticSearch,
) -> (GeneratorContext, Arc<RecordingProgress>) {
    let progress = Arc::new(RecordingProgress::default());
    let context =
        GeneratorContext::with_services(config, generator, Arc::new(search), progress.clone());
    (context, progress)
}
