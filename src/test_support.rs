//! 测试辅助

use std::sync::Arc;

use chrono::Utc;

use crate::allocation::{NamedId, SnapshotParts};
use crate::models::assignments::{
    entities::{Assignment, Participant, Team},
    requests::{CreateAssignmentRequest, CreateParticipantRequest, CreateTeamRequest},
};
use crate::storage::{Storage, sea_orm_storage::SeaOrmStorage};

/// 每份提交 2 份评审、不分组、不允许自评的作业
pub fn assignment(id: i64) -> Assignment {
    let now = Utc::now();
    Assignment {
        id,
        name: format!("assignment-{id}"),
        rounds_of_reviews: 1,
        reviews_per_submission: 2,
        calibration_enabled: false,
        has_topics: false,
        team_reviewing: false,
        allow_self_review: false,
        max_outstanding_reviews: None,
        created_at: now,
        updated_at: now,
    }
}

/// n 名参与者各自组成单人团队：参与者 i 属于团队 100+i
pub fn individuals(assignment: Assignment, n: usize) -> SnapshotParts {
    let n = n as i64;
    SnapshotParts {
        assignment,
        reviewers: (1..=n).map(|i| NamedId::new(i, format!("p{i}"))).collect(),
        reviewees: (1..=n)
            .map(|i| NamedId::new(100 + i, format!("t{i}")))
            .collect(),
        team_members: (1..=n).map(|i| (100 + i, i)).collect(),
        topics: vec![],
        mappings: vec![],
    }
}

pub async fn memory_storage() -> Arc<dyn Storage> {
    Arc::new(
        SeaOrmStorage::in_memory()
            .await
            .expect("in-memory storage should start"),
    )
}

pub fn assignment_request(name: &str) -> CreateAssignmentRequest {
    CreateAssignmentRequest {
        name: name.to_string(),
        rounds_of_reviews: None,
        reviews_per_submission: Some(2),
        calibration_enabled: None,
        has_topics: None,
        team_reviewing: None,
        allow_self_review: None,
        max_outstanding_reviews: None,
    }
}

/// 存储中已创建的单人团队名单
pub struct SeededRoster {
    pub assignment: Assignment,
    pub participants: Vec<Participant>,
    pub teams: Vec<Team>,
}

/// 创建作业与 n 名单人团队参与者（标识 p1..pn，团队 t1..tn）
pub async fn seed_individuals(
    storage: &Arc<dyn Storage>,
    req: CreateAssignmentRequest,
    n: usize,
) -> SeededRoster {
    let assignment = storage
        .create_assignment(req)
        .await
        .expect("create assignment");

    let mut participants = Vec::with_capacity(n);
    let mut teams = Vec::with_capacity(n);
    for i in 1..=n {
        let participant = storage
            .create_participant(
                assignment.id,
                CreateParticipantRequest {
                    handle: format!("p{i}"),
                    display_name: None,
                },
            )
            .await
            .expect("create participant");
        let team = storage
            .create_team(
                assignment.id,
                CreateTeamRequest {
                    name: format!("t{i}"),
                    member_ids: vec![participant.id],
                    is_calibration_artifact: false,
                },
            )
            .await
            .expect("create team");
        participants.push(participant);
        teams.push(team);
    }

    SeededRoster {
        assignment,
        participants,
        teams,
    }
}
