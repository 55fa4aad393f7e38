use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::generator::reviewer::ReviewVerdict;
use crate::generator::workflow::TimingScope;

/// 一个网页经过摘要后的调研结果，创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultItem {
    pub title: String,
    pub source_url: String,
    /// 只保留与原始问题相关的信息
    pub summary: String,
}

/// 调研结果在合并集合中的位置：所属分支（查询序号）与该分支内的搜索排名
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub branch: usize,
    pub rank: usize,
}

/// 并行分支共同累积的调研结果集合
///
/// 合并是按键取并集，满足结合律和交换律，重复合并同一分支的结果不会产生重复条目。
/// 迭代顺序为 (查询顺序, 搜索排名)，与分支完成的先后无关。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    items: BTreeMap<ItemKey, ResultItem>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以分支内的先后顺序作为排名构建单个分支的结果
    pub fn from_branch(branch: usize, items: Vec<ResultItem>) -> Self {
        let mut set = Self::new();
        for (rank, item) in items.into_iter().enumerate() {
            set.insert(ItemKey { branch, rank }, item);
        }
        set
    }

    pub fn insert(&mut self, key: ItemKey, item: ResultItem) {
        self.items.insert(key, item);
    }

    /// 合并另一个分支（或已合并集合）的结果
    pub fn merge(mut self, other: ResultSet) -> ResultSet {
        self.items.extend(other.items);
        self
    }

    pub fn merge_all<I>(sets: I) -> ResultSet
    where
        I: IntoIterator<Item = ResultSet>,
    {
        sets.into_iter().fold(ResultSet::new(), ResultSet::merge)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultItem> {
        self.items.values()
    }

    /// 按引用编号 (从1开始) 取结果
    pub fn get_cited(&self, index: usize) -> Option<&ResultItem> {
        index.checked_sub(1).and_then(|i| self.items.values().nth(i))
    }
}

/// 答案中某个引用编号对应的来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub index: usize,
    pub title: String,
    pub url: String,
}

/// 单次运行的状态，随运行创建，运行结束后交还调用方
#[derive(Debug, Clone)]
pub struct RunState {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    user_input: String,
    /// 规划阶段写入一次
    pub queries: Vec<String>,
    pub partial_results: ResultSet,
    /// 撰写阶段写入一次
    pub draft: String,
    pub composer_thinking: String,
    /// 与 `final_output` 中实际使用的引用编号一一对应
    pub references: Vec<Reference>,
    /// 审校阶段写入一次，未修订时等于 `draft`
    pub final_output: String,
    pub review: Option<ReviewVerdict>,
    pub review_feedback: String,
    pub reviewer_thinking: String,
    pub timing: TimingScope,
}

impl RunState {
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            user_input: user_input.into(),
            queries: Vec::new(),
            partial_results: ResultSet::new(),
            draft: String::new(),
            composer_thinking: String::new(),
            references: Vec::new(),
            final_output: String::new(),
            review: None,
            review_feedback: String::new(),
            reviewer_thinking: String::new(),
            timing: TimingScope::new(),
        }
    }

    pub fn user_input(&self) -> &str {
        &self.user_input
    }
}
