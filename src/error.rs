use thiserror::Error;

/// 研究流程中可识别的失败类型
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("the question is empty")]
    EmptyQuestion,

    /// 查询规划没有产出任何可用查询，整个流程无法继续
    #[error("query planning produced no usable search queries")]
    NoQueries,

    /// 撰写阶段没有产出正文
    #[error("the composer returned an empty draft")]
    EmptyDraft,

    #[error("research branch for query '{query}' failed: {source}")]
    BranchFailed {
        query: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{what} did not finish within {seconds}s")]
    CallTimedOut { what: String, seconds: u64 },

    #[error("the research run exceeded its {seconds}s deadline")]
    RunTimedOut { seconds: u64 },
}
