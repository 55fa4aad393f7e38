//! 网络搜索与网页正文提取

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{SearchConfig, SearchProvider};

mod tavily;

pub use tavily::TavilyClient;

/// 单条搜索命中
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
}

/// 搜索服务
///
/// `search` 按服务商返回的顺序给出命中；`extract` 在页面没有可用正文时返回 `Ok(None)`，
/// 只有请求本身失败才返回错误。
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;

    async fn extract(&self, url: &str) -> Result<Option<String>>;
}

/// 根据配置创建搜索客户端
pub fn create_search_client(config: &SearchConfig) -> Result<Box<dyn SearchClient>> {
    match config.provider {
        SearchProvider::Tavily => Ok(Box::new(TavilyClient::new(config)?)),
    }
}
