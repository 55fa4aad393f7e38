use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 模型档位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// 快速模型，适合结构化输出和批量摘要
    Efficient,
    /// 推理模型，适合长文撰写和审校
    Powerful,
}

/// 文本生成的用途，决定使用哪个档位的模型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationRole {
    /// 针对单个网页的相关信息摘要
    Summarize,
    /// 汇总全部摘要撰写带引用的答案
    Compose,
    /// 对照来源进行事实核查与修订
    Review,
}

impl GenerationRole {
    pub fn tier(&self) -> ModelTier {
        match self {
            GenerationRole::Summarize => ModelTier::Efficient,
            GenerationRole::Compose | GenerationRole::Review => ModelTier::Powerful,
        }
    }
}

impl std::fmt::Display for GenerationRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationRole::Summarize => write!(f, "summarize"),
            GenerationRole::Compose => write!(f, "compose"),
            GenerationRole::Review => write!(f, "review"),
        }
    }
}

/// 查询规划的结构化输出
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct QueryList {
    /// 用于网络搜索的查询语句，每条覆盖问题的一个不同方面
    pub queries: Vec<String>,
}
