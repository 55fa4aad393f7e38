//! LLM客户端 - 提供统一的文本生成服务接口

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::config::LLMConfig;

mod providers;
pub mod types;
pub mod utils;

use providers::ProviderClient;
use types::{GenerationRole, ModelTier, QueryList};
use utils::{model_for_tier, retry_with_backoff, with_timeout};

/// 文本生成服务
///
/// 工作流只依赖这个接口：给定提示词返回文本，文本前面可能带有
/// `<think>...</think>` 推理块，由调用方自行剥离。
#[async_trait]
pub trait Generator: Send + Sync {
    /// 按用途选择模型并返回原始文本
    async fn generate(
        &self,
        role: GenerationRole,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String>;

    /// 以结构化输出生成搜索查询列表
    async fn plan_queries(&self, system_prompt: &str, user_prompt: &str) -> Result<QueryList>;
}

/// 基于rig的LLM客户端
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// 检查模型连接是否正常
    pub async fn check_connection(&self) -> Result<()> {
        debug!(provider = %self.config.provider, "checking model connection");
        let agent = self.client.create_agent(
            model_for_tier(&self.config, ModelTier::Efficient),
            "You are a helpful assistant.",
            &self.config,
        );
        with_timeout(
            "connection check",
            self.config.timeout_seconds,
            agent.prompt("Hello"),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl Generator for LLMClient {
    async fn generate(
        &self,
        role: GenerationRole,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String> {
        let model = model_for_tier(&self.config, role.tier());
        let agent = self.client.create_agent(model, system_prompt, &self.config);
        let what = format!("{} ({})", role, model);

        debug!(%role, model, prompt_chars = user_prompt.len(), "invoking generator");
        retry_with_backoff(&self.config, &what, || agent.prompt(user_prompt)).await
    }

    async fn plan_queries(&self, system_prompt: &str, user_prompt: &str) -> Result<QueryList> {
        let model = model_for_tier(&self.config, ModelTier::Efficient);
        let extractor =
            self.client
                .create_extractor::<QueryList>(model, system_prompt, &self.config);
        let what = format!("query planning ({})", model);

        debug!(model, "invoking structured query extractor");
        retry_with_backoff(&self.config, &what, || extractor.extract(user_prompt)).await
    }
}
