//! 作业存储操作

use super::SeaOrmStorage;
use crate::entity::assignments::{ActiveModel, Entity as Assignments};
use crate::errors::{PeerReviewError, Result};
use crate::models::assignments::{
    entities::Assignment,
    requests::{CreateAssignmentRequest, UpdateAssignmentRequest},
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

impl SeaOrmStorage {
    /// 创建作业
    pub async fn create_assignment_impl(&self, req: CreateAssignmentRequest) -> Result<Assignment> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            name: Set(req.name.trim().to_string()),
            rounds_of_reviews: Set(req.rounds_of_reviews.unwrap_or(1)),
            reviews_per_submission: Set(req.reviews_per_submission.unwrap_or(3)),
            calibration_enabled: Set(req.calibration_enabled.unwrap_or(false)),
            has_topics: Set(req.has_topics.unwrap_or(false)),
            team_reviewing: Set(req.team_reviewing.unwrap_or(false)),
            allow_self_review: Set(req.allow_self_review.unwrap_or(false)),
            max_outstanding_reviews: Set(req.max_outstanding_reviews),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("创建作业失败: {e}")))?;

        Ok(result.into_assignment())
    }

    /// 通过 ID 获取作业
    pub async fn get_assignment_impl(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        let result = Assignments::find_by_id(assignment_id)
            .one(&self.db)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("查询作业失败: {e}")))?;

        Ok(result.map(|m| m.into_assignment()))
    }

    /// 更新作业配置
    pub async fn update_assignment_impl(
        &self,
        assignment_id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>> {
        // 先检查作业是否存在
        let existing = self.get_assignment_impl(assignment_id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(assignment_id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(rounds) = update.rounds_of_reviews {
            model.rounds_of_reviews = Set(rounds);
        }
        if let Some(per_submission) = update.reviews_per_submission {
            model.reviews_per_submission = Set(per_submission);
        }
        if let Some(enabled) = update.calibration_enabled {
            model.calibration_enabled = Set(enabled);
        }
        if let Some(has_topics) = update.has_topics {
            model.has_topics = Set(has_topics);
        }
        if let Some(team_reviewing) = update.team_reviewing {
            model.team_reviewing = Set(team_reviewing);
        }
        if let Some(allow) = update.allow_self_review {
            model.allow_self_review = Set(allow);
        }
        if update.clear_max_outstanding_reviews {
            model.max_outstanding_reviews = Set(None);
        } else if let Some(cap) = update.max_outstanding_reviews {
            model.max_outstanding_reviews = Set(Some(cap));
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("更新作业失败: {e}")))?;

        Ok(Some(result.into_assignment()))
    }
}
