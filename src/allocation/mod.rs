//! 评审分配策略
//!
//! 批量策略一次性生成评审对，动态策略按评审者的请求每次选出一个被评审团队。
//! 所有策略都只读取 [`AllocationSnapshot`]，持久化由 handler 统一完成。

pub mod csv_import;
pub mod governor;
pub mod least_reviewed_submission;
pub mod least_reviewed_topic;
pub mod random_static;
pub mod round_robin;
pub mod snapshot;

use serde::{Deserialize, Serialize};

pub use csv_import::CsvImport;
pub use governor::{CapacityCheck, OutstandingReviewGovernor};
pub use least_reviewed_submission::LeastReviewedSubmission;
pub use least_reviewed_topic::LeastReviewedTopic;
pub use random_static::RandomStatic;
pub use round_robin::RoundRobin;
pub use snapshot::{AllocationSnapshot, MappingFact, NamedId, SnapshotParts, TopicPool};

/// 策略类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    RoundRobin,
    RandomStatic,
    CsvImport,
    LeastReviewedSubmission,
    LeastReviewedTopic,
}

impl StrategyKind {
    pub fn is_dynamic(self) -> bool {
        match self {
            StrategyKind::RoundRobin | StrategyKind::RandomStatic | StrategyKind::CsvImport => {
                false
            }
            StrategyKind::LeastReviewedSubmission | StrategyKind::LeastReviewedTopic => true,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StrategyKind::RoundRobin => "round_robin",
            StrategyKind::RandomStatic => "random_static",
            StrategyKind::CsvImport => "csv_import",
            StrategyKind::LeastReviewedSubmission => "least_reviewed_submission",
            StrategyKind::LeastReviewedTopic => "least_reviewed_topic",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 一条评审关系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewPair {
    pub reviewer_id: i64,
    pub reviewee_id: i64,
}

impl ReviewPair {
    pub fn new(reviewer_id: i64, reviewee_id: i64) -> Self {
        Self {
            reviewer_id,
            reviewee_id,
        }
    }
}

/// 单条提议失败的原因，批量操作继续处理其余条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalError {
    /// CSV 行号（从 1 开始）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewee: Option<String>,
    pub message: String,
}

impl ProposalError {
    pub fn at_row(row: usize, message: impl Into<String>) -> Self {
        Self {
            row: Some(row),
            reviewer: None,
            reviewee: None,
            message: message.into(),
        }
    }

    pub fn for_pair(pair: ReviewPair, message: impl Into<String>) -> Self {
        Self {
            row: None,
            reviewer: Some(pair.reviewer_id.to_string()),
            reviewee: Some(pair.reviewee_id.to_string()),
            message: message.into(),
        }
    }

    pub fn with_reviewer(mut self, reviewer: impl Into<String>) -> Self {
        self.reviewer = Some(reviewer.into());
        self
    }

    pub fn with_reviewee(mut self, reviewee: impl Into<String>) -> Self {
        self.reviewee = Some(reviewee.into());
        self
    }
}

pub type Proposal = Result<ReviewPair, ProposalError>;

/// 批量分配策略，绕过未提交评审上限
pub trait BatchStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// 每个被评审团队的目标评审数，导入类策略没有目标
    fn target_per_reviewee(&self) -> Option<usize> {
        None
    }

    /// 惰性生成评审对
    fn propose_pairs<'a>(
        &'a self,
        snapshot: &'a AllocationSnapshot,
    ) -> Box<dyn Iterator<Item = Proposal> + Send + 'a>;
}

/// 动态分配策略
pub trait DynamicStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// 为评审者选出一个被评审团队，没有可选对象时返回 None
    fn assign_one(&self, reviewer_id: i64, snapshot: &AllocationSnapshot) -> Option<i64>;
}
