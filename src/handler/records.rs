//! 已有映射的维护：删除、评分、提交与从属记录

use tracing::{info, warn};

use super::ReviewMappingHandler;
use crate::errors::{PeerReviewError, Result};
use crate::models::review_mappings::entities::{
    DeletedMappings, DependentKind, ReviewDependent, ReviewMapping,
};

const MAX_GRADE: f64 = 100.0;
const MAX_COMMENT_CHARS: usize = 2000;

fn mapping_not_found(mapping_id: i64) -> PeerReviewError {
    PeerReviewError::not_found(format!("Review mapping {mapping_id} not found"))
}

impl ReviewMappingHandler {
    /// 删除映射及其反馈、元评审
    pub async fn delete_review_mapping(
        &self,
        assignment_id: i64,
        mapping_id: i64,
    ) -> Result<DeletedMappings> {
        let deleted = self
            .storage
            .delete_review_mapping(assignment_id, mapping_id)
            .await?;
        if deleted.mappings == 0 {
            return Err(mapping_not_found(mapping_id));
        }
        info!(
            "Deleted review mapping {} with {} dependents",
            mapping_id, deleted.dependents
        );
        Ok(deleted)
    }

    pub async fn delete_all_reviews_for(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
        include_calibration: bool,
    ) -> Result<DeletedMappings> {
        self.require_assignment(assignment_id).await?;
        let deleted = self
            .storage
            .delete_reviews_for_reviewer(assignment_id, reviewer_id, include_calibration)
            .await?;
        info!(
            "Deleted {} review mappings ({} dependents) of reviewer {} in assignment {}",
            deleted.mappings, deleted.dependents, reviewer_id, assignment_id
        );
        Ok(deleted)
    }

    /// 记录教师评分，不改动评审内容
    pub async fn grade_review(
        &self,
        assignment_id: i64,
        mapping_id: i64,
        grade: f64,
        comment: Option<String>,
    ) -> Result<ReviewMapping> {
        if !grade.is_finite() || !(0.0..=MAX_GRADE).contains(&grade) {
            return Err(PeerReviewError::validation(format!(
                "Grade must be between 0 and {MAX_GRADE}"
            )));
        }
        if comment
            .as_deref()
            .is_some_and(|c| c.chars().count() > MAX_COMMENT_CHARS)
        {
            return Err(PeerReviewError::validation(format!(
                "Comment must not exceed {MAX_COMMENT_CHARS} characters"
            )));
        }

        self.storage
            .grade_review_mapping(assignment_id, mapping_id, grade, comment)
            .await?
            .ok_or_else(|| {
                warn!("Grading skipped, mapping {} does not exist", mapping_id);
                mapping_not_found(mapping_id)
            })
    }

    /// 评审提交回调，重复调用结果不变
    pub async fn submit_review(&self, assignment_id: i64, mapping_id: i64) -> Result<ReviewMapping> {
        self.storage
            .mark_review_submitted(assignment_id, mapping_id)
            .await?
            .ok_or_else(|| mapping_not_found(mapping_id))
    }

    pub async fn add_dependent(
        &self,
        assignment_id: i64,
        mapping_id: i64,
        kind: DependentKind,
        reviewer_id: i64,
    ) -> Result<ReviewDependent> {
        if self
            .storage
            .get_review_mapping(assignment_id, mapping_id)
            .await?
            .is_none()
        {
            return Err(mapping_not_found(mapping_id));
        }
        self.storage
            .create_review_dependent(mapping_id, kind, reviewer_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReviewConfig;
    use crate::models::review_mappings::requests::ReviewMappingListQuery;
    use crate::test_support::{assignment_request, memory_storage, seed_individuals};

    #[tokio::test]
    async fn test_cascading_delete_and_missing_mapping() {
        let storage = memory_storage().await;
        let roster = seed_individuals(&storage, assignment_request("cascade"), 3).await;
        let handler = ReviewMappingHandler::new(storage.clone(), ReviewConfig::default());
        let a = roster.assignment.id;

        let mapping = storage
            .insert_review_mapping(a, roster.participants[0].id, roster.teams[1].id)
            .await
            .unwrap();
        handler
            .add_dependent(a, mapping.id, DependentKind::Feedback, roster.participants[1].id)
            .await
            .unwrap();

        let deleted = handler.delete_review_mapping(a, mapping.id).await.unwrap();
        assert_eq!(
            deleted,
            DeletedMappings {
                mappings: 1,
                dependents: 1
            }
        );

        let err = handler.delete_review_mapping(a, mapping.id).await.unwrap_err();
        assert!(matches!(err, PeerReviewError::NotFound(_)));
        let err = handler
            .add_dependent(a, mapping.id, DependentKind::Metareview, roster.participants[2].id)
            .await
            .unwrap_err();
        assert!(matches!(err, PeerReviewError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_without_dependents_leaves_others() {
        let storage = memory_storage().await;
        let roster = seed_individuals(&storage, assignment_request("isolated"), 3).await;
        let handler = ReviewMappingHandler::new(storage.clone(), ReviewConfig::default());
        let a = roster.assignment.id;
        let p = &roster.participants;
        let t = &roster.teams;

        let plain = storage.insert_review_mapping(a, p[0].id, t[1].id).await.unwrap();
        let with_feedback = storage.insert_review_mapping(a, p[1].id, t[2].id).await.unwrap();
        let other = storage.insert_review_mapping(a, p[2].id, t[0].id).await.unwrap();
        handler
            .add_dependent(a, with_feedback.id, DependentKind::Feedback, p[2].id)
            .await
            .unwrap();

        let deleted = handler.delete_review_mapping(a, plain.id).await.unwrap();
        assert_eq!(
            deleted,
            DeletedMappings {
                mappings: 1,
                dependents: 0
            }
        );

        let remaining: Vec<i64> = handler
            .list_review_mappings(a, ReviewMappingListQuery::default())
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(remaining, vec![with_feedback.id, other.id]);

        // 其他映射的从属记录仍在
        let deleted = handler.delete_review_mapping(a, with_feedback.id).await.unwrap();
        assert_eq!(deleted.dependents, 1);
    }

    #[tokio::test]
    async fn test_grade_validation() {
        let storage = memory_storage().await;
        let roster = seed_individuals(&storage, assignment_request("grading"), 2).await;
        let handler = ReviewMappingHandler::new(storage.clone(), ReviewConfig::default());
        let a = roster.assignment.id;
        let mapping = storage
            .insert_review_mapping(a, roster.participants[0].id, roster.teams[1].id)
            .await
            .unwrap();

        for grade in [-1.0, 100.5, f64::NAN, f64::INFINITY] {
            let err = handler.grade_review(a, mapping.id, grade, None).await.unwrap_err();
            assert!(matches!(err, PeerReviewError::Validation(_)));
        }

        let long = "x".repeat(MAX_COMMENT_CHARS + 1);
        let err = handler
            .grade_review(a, mapping.id, 50.0, Some(long))
            .await
            .unwrap_err();
        assert!(matches!(err, PeerReviewError::Validation(_)));

        let graded = handler
            .grade_review(a, mapping.id, 100.0, Some("ok".into()))
            .await
            .unwrap();
        assert_eq!(graded.instructor_grade, Some(100.0));
        assert!(!graded.submitted);

        let err = handler.grade_review(a, 9999, 50.0, None).await.unwrap_err();
        assert!(matches!(err, PeerReviewError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_all_requires_assignment() {
        let storage = memory_storage().await;
        let handler = ReviewMappingHandler::new(storage, ReviewConfig::default());
        let err = handler.delete_all_reviews_for(7, 1, false).await.unwrap_err();
        assert!(matches!(err, PeerReviewError::NotFound(_)));
    }
}
