/// 并行调研阶段的一个独立工作单元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// 查询在规划结果中的序号，也是合并结果时的分支编号
    pub branch: usize,
    pub query: String,
    pub user_input: String,
}

/// 每条查询展开为一个工作单元，不丢弃也不重复
pub fn dispatch(queries: &[String], user_input: &str) -> Vec<WorkItem> {
    queries
        .iter()
        .enumerate()
        .map(|(branch, query)| WorkItem {
            branch,
            query: query.clone(),
            user_input: user_input.to_string(),
        })
        .collect()
}
