//! 评审映射处理器
//!
//! 组合分配策略、未提交评审上限与存储层。每个操作都重新加载快照，
//! 不在请求之间保留任何计数。

pub mod audit;
pub mod batch;
pub mod dynamic;
pub mod records;

use std::sync::Arc;

use serde::Serialize;

use crate::allocation::{AllocationSnapshot, ProposalError, StrategyKind};
use crate::config::ReviewConfig;
use crate::errors::{PeerReviewError, Result};
use crate::models::assignments::entities::Assignment;
use crate::models::review_mappings::entities::ReviewMapping;
use crate::storage::Storage;

pub use audit::{WorkloadEntry, WorkloadSummary};

/// 批量分配结果
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub strategy: StrategyKind,
    /// 新建映射的 ID
    pub created: Vec<i64>,
    pub errors: Vec<ProposalError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_per_reviewee: Option<usize>,
    /// 未达到目标评审数的被评审团队
    pub shortfall: Vec<Shortfall>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Shortfall {
    pub reviewee_id: i64,
    pub missing: usize,
}

impl BatchReport {
    fn new(strategy: StrategyKind, target_per_reviewee: Option<usize>) -> Self {
        Self {
            strategy,
            created: Vec::new(),
            errors: Vec::new(),
            target_per_reviewee,
            shortfall: Vec::new(),
        }
    }
}

/// 动态分配结果
///
/// 没有容量与没有可选对象是两种不同的正常结果。
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicOutcome {
    Assigned(ReviewMapping),
    NoCapacity { outstanding: u64, cap: u32 },
    NothingEligible,
}

#[derive(Clone)]
pub struct ReviewMappingHandler {
    storage: Arc<dyn Storage>,
    review: ReviewConfig,
}

impl ReviewMappingHandler {
    pub fn new(storage: Arc<dyn Storage>, review: ReviewConfig) -> Self {
        Self { storage, review }
    }

    pub fn review_config(&self) -> &ReviewConfig {
        &self.review
    }

    pub(crate) async fn load_snapshot(&self, assignment_id: i64) -> Result<AllocationSnapshot> {
        let parts = self
            .storage
            .load_snapshot_parts(assignment_id)
            .await?
            .ok_or_else(|| assignment_not_found(assignment_id))?;
        Ok(AllocationSnapshot::new(parts))
    }

    pub(crate) async fn require_assignment(&self, assignment_id: i64) -> Result<Assignment> {
        self.storage
            .get_assignment(assignment_id)
            .await?
            .ok_or_else(|| assignment_not_found(assignment_id))
    }
}

pub(crate) fn assignment_not_found(assignment_id: i64) -> PeerReviewError {
    PeerReviewError::not_found(format!("Assignment {assignment_id} not found"))
}
