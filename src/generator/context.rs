use std::sync::Arc;

use crate::config::Config;
use crate::generator::progress::{ProgressSink, ProgressTracker};
use crate::llm::Generator;
use crate::search::SearchClient;

/// 工作流各阶段共享的只读上下文
///
/// 所有外部协作方（文本生成、搜索、进度展示）都从这里显式传入，阶段本身不持有全局状态。
#[derive(Clone)]
pub struct GeneratorContext {
    /// 配置
    pub config: Config,
    /// 文本生成服务
    pub generator: Arc<dyn Generator>,
    /// 搜索与网页提取服务
    pub search: Arc<dyn SearchClient>,
    /// 进度上报
    pub progress: ProgressTracker,
}

impl GeneratorContext {
    pub fn with_services(
        config: Config,
        generator: Arc<dyn Generator>,
        search: Arc<dyn SearchClient>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            config,
            generator,
            search,
            progress: ProgressTracker::new(progress),
        }
    }
}
