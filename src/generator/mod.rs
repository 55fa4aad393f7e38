// 调研工作流
// 规划(QueryPlanner) -> 分发(dispatch) -> N个并行调研分支(Researcher) -> 合并(ResultSet::merge)
// -> 撰写(DraftComposer) -> 审校(Reviewer)

pub mod composer;
pub mod context;
pub mod dispatcher;
pub mod outlet;
pub mod planner;
pub mod progress;
pub mod prompts;
pub mod researcher;
pub mod reviewer;
pub mod state;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;
