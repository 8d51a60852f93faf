//! 分配快照加载

use std::collections::BTreeMap;

use super::SeaOrmStorage;
use crate::allocation::{MappingFact, NamedId, SnapshotParts, TopicPool};
use crate::entity::{participants, review_mappings, signed_up_teams, team_members, teams, topics};
use crate::errors::{PeerReviewError, Result};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::debug;

impl SeaOrmStorage {
    pub async fn load_snapshot_parts_impl(
        &self,
        assignment_id: i64,
    ) -> Result<Option<SnapshotParts>> {
        let Some(assignment) = self.get_assignment_impl(assignment_id).await? else {
            return Ok(None);
        };

        let team_models = teams::Entity::find()
            .filter(teams::Column::AssignmentId.eq(assignment_id))
            .order_by_asc(teams::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("查询团队失败: {e}")))?;
        let team_ids: Vec<i64> = team_models.iter().map(|t| t.id).collect();

        // 校准样例不参与普通分配
        let reviewees: Vec<NamedId> = team_models
            .iter()
            .filter(|t| !t.is_calibration_artifact)
            .map(|t| NamedId::new(t.id, t.name.clone()))
            .collect();

        let reviewers = if assignment.team_reviewing {
            reviewees.clone()
        } else {
            participants::Entity::find()
                .filter(participants::Column::AssignmentId.eq(assignment_id))
                .order_by_asc(participants::Column::Id)
                .all(&self.db)
                .await
                .map_err(|e| PeerReviewError::database_operation(format!("查询参与者失败: {e}")))?
                .into_iter()
                .map(|p| NamedId::new(p.id, p.handle))
                .collect()
        };

        let team_members = if team_ids.is_empty() {
            Vec::new()
        } else {
            team_members::Entity::find()
                .filter(team_members::Column::TeamId.is_in(team_ids))
                .all(&self.db)
                .await
                .map_err(|e| {
                    PeerReviewError::database_operation(format!("查询团队成员失败: {e}"))
                })?
                .into_iter()
                .map(|m| (m.team_id, m.participant_id))
                .collect()
        };

        let topics = self.load_topic_pools(assignment_id).await?;

        let mappings: Vec<MappingFact> = review_mappings::Entity::find()
            .filter(review_mappings::Column::AssignmentId.eq(assignment_id))
            .filter(review_mappings::Column::IsCalibration.eq(false))
            .all(&self.db)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("查询评审映射失败: {e}")))?
            .into_iter()
            .map(|m| MappingFact {
                reviewer_id: m.reviewer_id,
                reviewee_id: m.reviewee_id,
                submitted: m.submitted,
                created_at: m.created_at,
            })
            .collect();

        debug!(
            "Loaded snapshot for assignment {}: {} reviewers, {} reviewees, {} mappings",
            assignment_id,
            reviewers.len(),
            reviewees.len(),
            mappings.len()
        );

        Ok(Some(SnapshotParts {
            assignment,
            reviewers,
            reviewees,
            team_members,
            topics,
            mappings,
        }))
    }

    async fn load_topic_pools(&self, assignment_id: i64) -> Result<Vec<TopicPool>> {
        let topic_ids: Vec<i64> = topics::Entity::find()
            .filter(topics::Column::AssignmentId.eq(assignment_id))
            .all(&self.db)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("查询选题失败: {e}")))?
            .into_iter()
            .map(|t| t.id)
            .collect();
        if topic_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pools: BTreeMap<i64, Vec<i64>> =
            topic_ids.iter().map(|&id| (id, Vec::new())).collect();

        let signups = signed_up_teams::Entity::find()
            .filter(signed_up_teams::Column::TopicId.is_in(topic_ids))
            .all(&self.db)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("查询选题报名失败: {e}")))?;
        for signup in signups {
            pools.entry(signup.topic_id).or_default().push(signup.team_id);
        }

        Ok(pools
            .into_iter()
            .map(|(topic_id, team_ids)| TopicPool { topic_id, team_ids })
            .collect())
    }
}
