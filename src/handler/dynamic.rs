//! 动态分配

use tracing::{info, warn};

use super::{DynamicOutcome, ReviewMappingHandler};
use crate::allocation::{
    AllocationSnapshot, DynamicStrategy, LeastReviewedSubmission, LeastReviewedTopic,
    OutstandingReviewGovernor,
};
use crate::errors::{PeerReviewError, Result};
use crate::models::review_mappings::entities::ReviewMapping;
use crate::storage::CappedInsert;

impl ReviewMappingHandler {
    /// 评审者请求一份评审：先检查上限，再由策略选择被评审团队
    pub async fn assign_dynamically(
        &self,
        assignment_id: i64,
        strategy: &dyn DynamicStrategy,
        reviewer_id: i64,
        max_outstanding: Option<u32>,
    ) -> Result<DynamicOutcome> {
        let snapshot = self.load_snapshot(assignment_id).await?;
        self.assign_from_snapshot(&snapshot, strategy, reviewer_id, max_outstanding)
            .await
    }

    pub async fn assign_least_reviewed(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
        max_outstanding: Option<u32>,
    ) -> Result<DynamicOutcome> {
        self.assign_dynamically(
            assignment_id,
            &LeastReviewedSubmission,
            reviewer_id,
            max_outstanding,
        )
        .await
    }

    /// 选题均衡分配，窗口大小与未提交上限相互独立
    pub async fn assign_dynamic_topic_fairly(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
        fairness_window: Option<usize>,
        max_outstanding: Option<u32>,
    ) -> Result<DynamicOutcome> {
        let snapshot = self.load_snapshot(assignment_id).await?;
        if !snapshot.assignment().has_topics {
            return Err(PeerReviewError::validation(format!(
                "Assignment {assignment_id} does not use topics"
            )));
        }

        let window = match fairness_window {
            Some(0) => {
                return Err(PeerReviewError::validation("k must be at least 1"));
            }
            Some(k) => k,
            None => self.review.default_topic_window,
        };

        self.assign_from_snapshot(
            &snapshot,
            &LeastReviewedTopic::new(window),
            reviewer_id,
            max_outstanding,
        )
        .await
    }

    async fn assign_from_snapshot(
        &self,
        snapshot: &AllocationSnapshot,
        strategy: &dyn DynamicStrategy,
        reviewer_id: i64,
        max_outstanding: Option<u32>,
    ) -> Result<DynamicOutcome> {
        let assignment_id = snapshot.assignment().id;
        let kind = strategy.kind();

        if !snapshot.contains_reviewer(reviewer_id) {
            return Err(PeerReviewError::not_found(format!(
                "Reviewer {reviewer_id} not found in assignment {assignment_id}"
            )));
        }

        let cap =
            OutstandingReviewGovernor::resolve_cap(max_outstanding, snapshot.assignment(), &self.review)?;
        let check = OutstandingReviewGovernor::new(cap)
            .evaluate(snapshot.outstanding_for(reviewer_id) as u64);
        if !check.allowed {
            warn!(
                "[{}] reviewer {} refused: {}/{} reviews outstanding",
                kind, reviewer_id, check.outstanding, cap
            );
            return Ok(DynamicOutcome::NoCapacity {
                outstanding: check.outstanding,
                cap,
            });
        }

        let Some(reviewee_id) = strategy.assign_one(reviewer_id, snapshot) else {
            info!(
                "[{}] nothing eligible for reviewer {} in assignment {}",
                kind, reviewer_id, assignment_id
            );
            return Ok(DynamicOutcome::NothingEligible);
        };

        match self
            .storage
            .insert_capped_review_mapping(assignment_id, reviewer_id, reviewee_id, cap)
            .await?
        {
            CappedInsert::Inserted(mapping) => {
                info!(
                    "[{}] reviewer {} assigned reviewee {} (mapping {})",
                    kind, reviewer_id, reviewee_id, mapping.id
                );
                Ok(DynamicOutcome::Assigned(mapping))
            }
            CappedInsert::CapacityExhausted { outstanding } => {
                warn!(
                    "[{}] reviewer {} refused at insert: {}/{} reviews outstanding",
                    kind, reviewer_id, outstanding, cap
                );
                Ok(DynamicOutcome::NoCapacity { outstanding, cap })
            }
        }
    }

    /// 校准评审：不检查上限，也不受唯一约束限制
    pub async fn assign_calibration_review(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
        submission_id: i64,
    ) -> Result<ReviewMapping> {
        let assignment = self.require_assignment(assignment_id).await?;
        if !assignment.calibration_enabled {
            return Err(PeerReviewError::validation(format!(
                "Calibration is not enabled for assignment {assignment_id}"
            )));
        }

        if self
            .storage
            .get_team(assignment_id, submission_id)
            .await?
            .is_none()
        {
            return Err(PeerReviewError::not_found(format!(
                "Team {submission_id} not found in assignment {assignment_id}"
            )));
        }
        if !self.storage.reviewer_exists(&assignment, reviewer_id).await? {
            return Err(PeerReviewError::not_found(format!(
                "Reviewer {reviewer_id} not found in assignment {assignment_id}"
            )));
        }

        let mapping = self
            .storage
            .insert_calibration_mapping(assignment_id, reviewer_id, submission_id)
            .await?;
        info!(
            "Calibration review {} created: reviewer {} -> team {}",
            mapping.id, reviewer_id, submission_id
        );
        Ok(mapping)
    }
}
