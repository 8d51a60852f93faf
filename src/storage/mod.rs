use std::sync::Arc;

use crate::allocation::SnapshotParts;
use crate::models::{
    assignments::{
        entities::{Assignment, Participant, Team, Topic, TopicSignup},
        requests::{
            CreateAssignmentRequest, CreateParticipantRequest, CreateTeamRequest,
            CreateTopicRequest, UpdateAssignmentRequest,
        },
    },
    review_mappings::{
        entities::{DeletedMappings, DependentKind, ReviewDependent, ReviewMapping},
        requests::ReviewMappingListQuery,
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

/// 带上限的插入结果
#[derive(Debug, Clone, PartialEq)]
pub enum CappedInsert {
    Inserted(ReviewMapping),
    /// 事务内重新计数后发现已达上限
    CapacityExhausted { outstanding: u64 },
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 作业管理方法
    // 创建作业
    async fn create_assignment(&self, req: CreateAssignmentRequest) -> Result<Assignment>;
    // 通过ID获取作业
    async fn get_assignment(&self, assignment_id: i64) -> Result<Option<Assignment>>;
    // 更新作业配置
    async fn update_assignment(
        &self,
        assignment_id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>>;

    /// 名单管理方法
    // 添加参与者（标识重复时返回 Conflict）
    async fn create_participant(
        &self,
        assignment_id: i64,
        req: CreateParticipantRequest,
    ) -> Result<Participant>;
    // 创建团队及其成员
    async fn create_team(&self, assignment_id: i64, req: CreateTeamRequest) -> Result<Team>;
    // 获取团队
    async fn get_team(&self, assignment_id: i64, team_id: i64) -> Result<Option<Team>>;
    // 创建选题
    async fn create_topic(&self, assignment_id: i64, req: CreateTopicRequest) -> Result<Topic>;
    // 团队报名选题
    async fn sign_up_team(
        &self,
        assignment_id: i64,
        topic_id: i64,
        team_id: i64,
    ) -> Result<TopicSignup>;
    // 评审者是否存在（参与者，团队评审时为团队）
    async fn reviewer_exists(&self, assignment: &Assignment, reviewer_id: i64) -> Result<bool>;

    /// 分配快照
    // 加载作业的评审者、被评审团队、选题与普通映射；作业不存在时返回 None
    async fn load_snapshot_parts(&self, assignment_id: i64) -> Result<Option<SnapshotParts>>;

    /// 评审映射方法
    // 插入普通映射（唯一约束冲突返回 Conflict）
    async fn insert_review_mapping(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
        reviewee_id: i64,
    ) -> Result<ReviewMapping>;
    // 在单个事务内锁定评审者、重新计数并插入普通映射
    async fn insert_capped_review_mapping(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
        reviewee_id: i64,
        cap: u32,
    ) -> Result<CappedInsert>;
    // 插入校准映射（不受唯一约束与上限限制）
    async fn insert_calibration_mapping(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
        reviewee_id: i64,
    ) -> Result<ReviewMapping>;
    // 评审者未提交的普通映射数
    async fn count_outstanding_reviews(&self, assignment_id: i64, reviewer_id: i64)
    -> Result<u64>;
    // 获取映射
    async fn get_review_mapping(
        &self,
        assignment_id: i64,
        mapping_id: i64,
    ) -> Result<Option<ReviewMapping>>;
    // 列出映射
    async fn list_review_mappings(
        &self,
        assignment_id: i64,
        query: ReviewMappingListQuery,
    ) -> Result<Vec<ReviewMapping>>;
    // 删除映射及其从属记录
    async fn delete_review_mapping(
        &self,
        assignment_id: i64,
        mapping_id: i64,
    ) -> Result<DeletedMappings>;
    // 删除评审者的全部映射及其从属记录
    async fn delete_reviews_for_reviewer(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
        include_calibration: bool,
    ) -> Result<DeletedMappings>;
    // 记录教师评分
    async fn grade_review_mapping(
        &self,
        assignment_id: i64,
        mapping_id: i64,
        grade: f64,
        comment: Option<String>,
    ) -> Result<Option<ReviewMapping>>;
    // 标记评审已提交（只会从 false 变为 true）
    async fn mark_review_submitted(
        &self,
        assignment_id: i64,
        mapping_id: i64,
    ) -> Result<Option<ReviewMapping>>;
    // 创建反馈或元评审
    async fn create_review_dependent(
        &self,
        mapping_id: i64,
        kind: DependentKind,
        reviewer_id: i64,
    ) -> Result<ReviewDependent>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
