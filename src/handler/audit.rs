//! 分配情况查询

use serde::Serialize;

use super::ReviewMappingHandler;
use crate::allocation::{CapacityCheck, OutstandingReviewGovernor};
use crate::errors::{PeerReviewError, Result};
use crate::models::review_mappings::{
    entities::ReviewMapping, requests::ReviewMappingListQuery,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadEntry {
    pub id: i64,
    pub name: String,
    pub total: usize,
    pub outstanding: usize,
}

/// 评审者与被评审团队的普通映射统计
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadSummary {
    pub reviewers: Vec<WorkloadEntry>,
    pub reviewees: Vec<WorkloadEntry>,
    /// 评审者负载最大值与最小值之差
    pub reviewer_spread: usize,
}

impl ReviewMappingHandler {
    /// 用存储中的最新计数判断评审者能否再接受评审
    pub async fn can_accept_more_reviews(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
        max_outstanding: Option<u32>,
    ) -> Result<CapacityCheck> {
        let assignment = self.require_assignment(assignment_id).await?;
        if !self.storage.reviewer_exists(&assignment, reviewer_id).await? {
            return Err(PeerReviewError::not_found(format!(
                "Reviewer {reviewer_id} not found in assignment {assignment_id}"
            )));
        }

        let cap = OutstandingReviewGovernor::resolve_cap(max_outstanding, &assignment, &self.review)?;
        let outstanding = self
            .storage
            .count_outstanding_reviews(assignment_id, reviewer_id)
            .await?;
        Ok(OutstandingReviewGovernor::new(cap).evaluate(outstanding))
    }

    pub async fn list_review_mappings(
        &self,
        assignment_id: i64,
        query: ReviewMappingListQuery,
    ) -> Result<Vec<ReviewMapping>> {
        self.require_assignment(assignment_id).await?;
        self.storage.list_review_mappings(assignment_id, query).await
    }

    pub async fn workload_summary(&self, assignment_id: i64) -> Result<WorkloadSummary> {
        let snapshot = self.load_snapshot(assignment_id).await?;

        let reviewers: Vec<WorkloadEntry> = snapshot
            .reviewers()
            .iter()
            .map(|r| WorkloadEntry {
                id: r.id,
                name: r.name.clone(),
                total: snapshot.reviewer_total(r.id),
                outstanding: snapshot.outstanding_for(r.id),
            })
            .collect();
        let reviewees = snapshot
            .reviewees()
            .iter()
            .map(|r| {
                let load = snapshot.reviewee_load(r.id);
                WorkloadEntry {
                    id: r.id,
                    name: r.name.clone(),
                    total: load.total,
                    outstanding: load.outstanding,
                }
            })
            .collect();

        let max = reviewers.iter().map(|r| r.total).max().unwrap_or(0);
        let min = reviewers.iter().map(|r| r.total).min().unwrap_or(0);

        Ok(WorkloadSummary {
            reviewers,
            reviewees,
            reviewer_spread: max - min,
        })
    }
}
