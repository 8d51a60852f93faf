//! 名单存储操作（参与者、团队、选题）

use std::collections::BTreeSet;

use super::SeaOrmStorage;
use crate::entity::{participants, signed_up_teams, team_members, teams, topics};
use crate::errors::{PeerReviewError, Result};
use crate::models::assignments::{
    entities::{Assignment, Participant, Team, Topic, TopicSignup},
    requests::{CreateParticipantRequest, CreateTeamRequest, CreateTopicRequest},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

impl SeaOrmStorage {
    /// 添加参与者
    pub async fn create_participant_impl(
        &self,
        assignment_id: i64,
        req: CreateParticipantRequest,
    ) -> Result<Participant> {
        let now = chrono::Utc::now().timestamp();

        let model = participants::ActiveModel {
            assignment_id: Set(assignment_id),
            handle: Set(req.handle.trim().to_string()),
            display_name: Set(req.display_name),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PeerReviewError::from_db(e, "添加参与者失败"))?;

        Ok(result.into_participant())
    }

    /// 创建团队及其成员
    pub async fn create_team_impl(
        &self,
        assignment_id: i64,
        req: CreateTeamRequest,
    ) -> Result<Team> {
        let now = chrono::Utc::now().timestamp();
        let member_ids: BTreeSet<i64> = req.member_ids.into_iter().collect();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("开启事务失败: {e}")))?;

        // 成员必须是本作业的参与者
        if !member_ids.is_empty() {
            let found = participants::Entity::find()
                .filter(participants::Column::AssignmentId.eq(assignment_id))
                .filter(participants::Column::Id.is_in(member_ids.iter().copied()))
                .count(&txn)
                .await
                .map_err(|e| {
                    PeerReviewError::database_operation(format!("查询参与者失败: {e}"))
                })?;
            if found != member_ids.len() as u64 {
                return Err(PeerReviewError::validation(
                    "All team members must be participants of the assignment",
                ));
            }
        }

        let team = teams::ActiveModel {
            assignment_id: Set(assignment_id),
            name: Set(req.name.trim().to_string()),
            is_calibration_artifact: Set(req.is_calibration_artifact),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| PeerReviewError::from_db(e, "创建团队失败"))?;

        for &participant_id in &member_ids {
            team_members::ActiveModel {
                team_id: Set(team.id),
                participant_id: Set(participant_id),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| PeerReviewError::from_db(e, "添加团队成员失败"))?;
        }

        txn.commit()
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(team.into_team(member_ids.into_iter().collect()))
    }

    /// 获取团队及成员
    pub async fn get_team_impl(&self, assignment_id: i64, team_id: i64) -> Result<Option<Team>> {
        let Some(team) = teams::Entity::find_by_id(team_id)
            .filter(teams::Column::AssignmentId.eq(assignment_id))
            .one(&self.db)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("查询团队失败: {e}")))?
        else {
            return Ok(None);
        };

        let member_ids = team_members::Entity::find()
            .filter(team_members::Column::TeamId.eq(team_id))
            .order_by_asc(team_members::Column::ParticipantId)
            .all(&self.db)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("查询团队成员失败: {e}")))?
            .into_iter()
            .map(|m| m.participant_id)
            .collect();

        Ok(Some(team.into_team(member_ids)))
    }

    /// 创建选题
    pub async fn create_topic_impl(
        &self,
        assignment_id: i64,
        req: CreateTopicRequest,
    ) -> Result<Topic> {
        let model = topics::ActiveModel {
            assignment_id: Set(assignment_id),
            name: Set(req.name.trim().to_string()),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("创建选题失败: {e}")))?;

        Ok(result.into_topic())
    }

    /// 团队报名选题
    pub async fn sign_up_team_impl(
        &self,
        assignment_id: i64,
        topic_id: i64,
        team_id: i64,
    ) -> Result<TopicSignup> {
        let topic = topics::Entity::find_by_id(topic_id)
            .filter(topics::Column::AssignmentId.eq(assignment_id))
            .one(&self.db)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("查询选题失败: {e}")))?;
        if topic.is_none() {
            return Err(PeerReviewError::not_found(format!(
                "Topic {topic_id} not found in assignment {assignment_id}"
            )));
        }

        let team = teams::Entity::find_by_id(team_id)
            .filter(teams::Column::AssignmentId.eq(assignment_id))
            .one(&self.db)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("查询团队失败: {e}")))?;
        if team.is_none() {
            return Err(PeerReviewError::not_found(format!(
                "Team {team_id} not found in assignment {assignment_id}"
            )));
        }

        let model = signed_up_teams::ActiveModel {
            topic_id: Set(topic_id),
            team_id: Set(team_id),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PeerReviewError::from_db(e, "选题报名失败"))?;

        Ok(result.into_signup())
    }

    /// 评审者是否属于作业
    pub async fn reviewer_exists_impl(
        &self,
        assignment: &Assignment,
        reviewer_id: i64,
    ) -> Result<bool> {
        let count = if assignment.team_reviewing {
            teams::Entity::find_by_id(reviewer_id)
                .filter(teams::Column::AssignmentId.eq(assignment.id))
                .filter(teams::Column::IsCalibrationArtifact.eq(false))
                .count(&self.db)
                .await
        } else {
            participants::Entity::find_by_id(reviewer_id)
                .filter(participants::Column::AssignmentId.eq(assignment.id))
                .count(&self.db)
                .await
        }
        .map_err(|e| PeerReviewError::database_operation(format!("查询评审者失败: {e}")))?;

        Ok(count > 0)
    }
}
