//! 评审映射存储操作

use super::SeaOrmStorage;
use crate::entity::review_mappings::{
    ActiveModel, Column, Entity as ReviewMappings, ORDINARY_SLOT,
};
use crate::entity::{assignments, participants, review_dependents, teams};
use crate::errors::{PeerReviewError, Result};
use crate::models::review_mappings::{
    entities::{DeletedMappings, DependentKind, ReviewDependent, ReviewMapping},
    requests::ReviewMappingListQuery,
};
use crate::storage::CappedInsert;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, warn};

impl SeaOrmStorage {
    fn ordinary_model(assignment_id: i64, reviewer_id: i64, reviewee_id: i64) -> ActiveModel {
        ActiveModel {
            assignment_id: Set(assignment_id),
            reviewer_id: Set(reviewer_id),
            reviewee_id: Set(reviewee_id),
            is_calibration: Set(false),
            ordinary_slot: Set(Some(ORDINARY_SLOT)),
            submitted: Set(false),
            created_at: Set(Self::now_millis()),
            ..Default::default()
        }
    }

    /// 插入普通映射
    pub async fn insert_review_mapping_impl(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
        reviewee_id: i64,
    ) -> Result<ReviewMapping> {
        let result = Self::ordinary_model(assignment_id, reviewer_id, reviewee_id)
            .insert(&self.db)
            .await
            .map_err(|e| PeerReviewError::from_db(e, "创建评审映射失败"))?;

        Ok(result.into_review_mapping())
    }

    /// 带上限的插入
    ///
    /// 先更新评审者行的 updated_at 取得行锁（SQLite 上为写锁），同一评审者的并发请求
    /// 在此排队；随后在同一事务内重新统计未提交数，达到上限则放弃插入。
    pub async fn insert_capped_review_mapping_impl(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
        reviewee_id: i64,
        cap: u32,
    ) -> Result<CappedInsert> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("开启事务失败: {e}")))?;

        let assignment = assignments::Entity::find_by_id(assignment_id)
            .one(&txn)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("查询作业失败: {e}")))?
            .ok_or_else(|| {
                PeerReviewError::not_found(format!("Assignment {assignment_id} not found"))
            })?;

        let now = chrono::Utc::now().timestamp();
        let touched = if assignment.team_reviewing {
            teams::Entity::update_many()
                .col_expr(
                    teams::Column::UpdatedAt,
                    sea_orm::sea_query::Expr::value(now),
                )
                .filter(teams::Column::Id.eq(reviewer_id))
                .filter(teams::Column::AssignmentId.eq(assignment_id))
                .exec(&txn)
                .await
        } else {
            participants::Entity::update_many()
                .col_expr(
                    participants::Column::UpdatedAt,
                    sea_orm::sea_query::Expr::value(now),
                )
                .filter(participants::Column::Id.eq(reviewer_id))
                .filter(participants::Column::AssignmentId.eq(assignment_id))
                .exec(&txn)
                .await
        }
        .map_err(|e| PeerReviewError::database_operation(format!("锁定评审者失败: {e}")))?
        .rows_affected;

        if touched == 0 {
            return Err(PeerReviewError::not_found(format!(
                "Reviewer {reviewer_id} not found in assignment {assignment_id}"
            )));
        }

        let outstanding = Self::count_outstanding_in(&txn, assignment_id, reviewer_id).await?;
        if outstanding >= u64::from(cap) {
            txn.rollback().await.map_err(|e| {
                PeerReviewError::database_operation(format!("回滚事务失败: {e}"))
            })?;
            warn!(
                "Reviewer {} reached the outstanding cap inside the insert transaction ({}/{})",
                reviewer_id, outstanding, cap
            );
            return Ok(CappedInsert::CapacityExhausted { outstanding });
        }

        let result = Self::ordinary_model(assignment_id, reviewer_id, reviewee_id)
            .insert(&txn)
            .await
            .map_err(|e| PeerReviewError::from_db(e, "创建评审映射失败"))?;

        txn.commit()
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(CappedInsert::Inserted(result.into_review_mapping()))
    }

    /// 插入校准映射
    pub async fn insert_calibration_mapping_impl(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
        reviewee_id: i64,
    ) -> Result<ReviewMapping> {
        let model = ActiveModel {
            assignment_id: Set(assignment_id),
            reviewer_id: Set(reviewer_id),
            reviewee_id: Set(reviewee_id),
            is_calibration: Set(true),
            ordinary_slot: Set(None),
            submitted: Set(false),
            created_at: Set(Self::now_millis()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PeerReviewError::from_db(e, "创建校准映射失败"))?;

        Ok(result.into_review_mapping())
    }

    async fn count_outstanding_in<C: ConnectionTrait>(
        conn: &C,
        assignment_id: i64,
        reviewer_id: i64,
    ) -> Result<u64> {
        ReviewMappings::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::ReviewerId.eq(reviewer_id))
            .filter(Column::IsCalibration.eq(false))
            .filter(Column::Submitted.eq(false))
            .count(conn)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("统计未提交评审失败: {e}")))
    }

    /// 评审者未提交的普通映射数
    pub async fn count_outstanding_reviews_impl(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
    ) -> Result<u64> {
        Self::count_outstanding_in(&self.db, assignment_id, reviewer_id).await
    }

    /// 获取映射
    pub async fn get_review_mapping_impl(
        &self,
        assignment_id: i64,
        mapping_id: i64,
    ) -> Result<Option<ReviewMapping>> {
        let result = ReviewMappings::find_by_id(mapping_id)
            .filter(Column::AssignmentId.eq(assignment_id))
            .one(&self.db)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("查询评审映射失败: {e}")))?;

        Ok(result.map(|m| m.into_review_mapping()))
    }

    /// 列出映射
    pub async fn list_review_mappings_impl(
        &self,
        assignment_id: i64,
        query: ReviewMappingListQuery,
    ) -> Result<Vec<ReviewMapping>> {
        let mut select = ReviewMappings::find().filter(Column::AssignmentId.eq(assignment_id));

        if let Some(reviewer_id) = query.reviewer_id {
            select = select.filter(Column::ReviewerId.eq(reviewer_id));
        }
        if let Some(reviewee_id) = query.reviewee_id {
            select = select.filter(Column::RevieweeId.eq(reviewee_id));
        }
        if !query.include_calibration {
            select = select.filter(Column::IsCalibration.eq(false));
        }

        let result = select
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("查询评审映射失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_review_mapping()).collect())
    }

    /// 删除映射及其从属记录
    pub async fn delete_review_mapping_impl(
        &self,
        assignment_id: i64,
        mapping_id: i64,
    ) -> Result<DeletedMappings> {
        self.delete_mappings_where(
            ReviewMappings::find()
                .filter(Column::AssignmentId.eq(assignment_id))
                .filter(Column::Id.eq(mapping_id)),
        )
        .await
    }

    /// 删除评审者的全部映射
    pub async fn delete_reviews_for_reviewer_impl(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
        include_calibration: bool,
    ) -> Result<DeletedMappings> {
        let mut select = ReviewMappings::find()
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::ReviewerId.eq(reviewer_id));
        if !include_calibration {
            select = select.filter(Column::IsCalibration.eq(false));
        }
        self.delete_mappings_where(select).await
    }

    /// 在同一事务内删除映射与其反馈、元评审
    async fn delete_mappings_where(
        &self,
        select: sea_orm::Select<ReviewMappings>,
    ) -> Result<DeletedMappings> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("开启事务失败: {e}")))?;

        let ids: Vec<i64> = select
            .select_only()
            .column(Column::Id)
            .into_tuple()
            .all(&txn)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("查询评审映射失败: {e}")))?;

        if ids.is_empty() {
            return Ok(DeletedMappings::default());
        }

        let dependents = review_dependents::Entity::delete_many()
            .filter(review_dependents::Column::ReviewMappingId.is_in(ids.clone()))
            .exec(&txn)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("删除从属记录失败: {e}")))?
            .rows_affected;

        let mappings = ReviewMappings::delete_many()
            .filter(Column::Id.is_in(ids))
            .exec(&txn)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("删除评审映射失败: {e}")))?
            .rows_affected;

        txn.commit()
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("提交事务失败: {e}")))?;

        debug!(
            "Deleted {} review mappings and {} dependents",
            mappings, dependents
        );

        Ok(DeletedMappings {
            mappings,
            dependents,
        })
    }

    /// 记录教师评分
    pub async fn grade_review_mapping_impl(
        &self,
        assignment_id: i64,
        mapping_id: i64,
        grade: f64,
        comment: Option<String>,
    ) -> Result<Option<ReviewMapping>> {
        let Some(existing) = ReviewMappings::find_by_id(mapping_id)
            .filter(Column::AssignmentId.eq(assignment_id))
            .one(&self.db)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("查询评审映射失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.instructor_grade = Set(Some(grade));
        model.instructor_comment = Set(comment);
        model.graded_at = Set(Some(Self::now_millis()));

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("评分失败: {e}")))?;

        Ok(Some(result.into_review_mapping()))
    }

    /// 标记评审已提交
    pub async fn mark_review_submitted_impl(
        &self,
        assignment_id: i64,
        mapping_id: i64,
    ) -> Result<Option<ReviewMapping>> {
        // 只更新尚未提交的映射，重复提交不改变提交时间
        ReviewMappings::update_many()
            .col_expr(Column::Submitted, sea_orm::sea_query::Expr::value(true))
            .col_expr(
                Column::SubmittedAt,
                sea_orm::sea_query::Expr::value(Self::now_millis()),
            )
            .filter(Column::Id.eq(mapping_id))
            .filter(Column::AssignmentId.eq(assignment_id))
            .filter(Column::Submitted.eq(false))
            .exec(&self.db)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("提交评审失败: {e}")))?;

        self.get_review_mapping_impl(assignment_id, mapping_id)
            .await
    }

    /// 创建反馈或元评审
    pub async fn create_review_dependent_impl(
        &self,
        mapping_id: i64,
        kind: DependentKind,
        reviewer_id: i64,
    ) -> Result<ReviewDependent> {
        let model = review_dependents::ActiveModel {
            review_mapping_id: Set(mapping_id),
            kind: Set(kind.to_string()),
            reviewer_id: Set(reviewer_id),
            created_at: Set(Self::now_millis()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PeerReviewError::from_db(e, "创建从属记录失败"))?;

        Ok(result.into_review_dependent())
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::PeerReviewError;
    use crate::models::review_mappings::{
        entities::DependentKind, requests::ReviewMappingListQuery,
    };
    use crate::storage::CappedInsert;
    use crate::test_support::{assignment_request, memory_storage, seed_individuals};

    #[tokio::test]
    async fn test_duplicate_ordinary_mapping_is_conflict() {
        let storage = memory_storage().await;
        let roster = seed_individuals(&storage, assignment_request("dup"), 2).await;
        let a = roster.assignment.id;
        let reviewer = roster.participants[0].id;
        let reviewee = roster.teams[1].id;

        storage
            .insert_review_mapping(a, reviewer, reviewee)
            .await
            .unwrap();
        let err = storage
            .insert_review_mapping(a, reviewer, reviewee)
            .await
            .unwrap_err();
        assert!(matches!(err, PeerReviewError::Conflict(_)));

        // 校准映射不受唯一约束限制
        storage
            .insert_calibration_mapping(a, reviewer, reviewee)
            .await
            .unwrap();
        storage
            .insert_calibration_mapping(a, reviewer, reviewee)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_capped_insert_stops_at_cap() {
        let storage = memory_storage().await;
        let roster = seed_individuals(&storage, assignment_request("cap"), 4).await;
        let a = roster.assignment.id;
        let reviewer = roster.participants[0].id;

        for team in &roster.teams[1..3] {
            let result = storage
                .insert_capped_review_mapping(a, reviewer, team.id, 2)
                .await
                .unwrap();
            assert!(matches!(result, CappedInsert::Inserted(_)));
        }

        let refused = storage
            .insert_capped_review_mapping(a, reviewer, roster.teams[3].id, 2)
            .await
            .unwrap();
        assert_eq!(refused, CappedInsert::CapacityExhausted { outstanding: 2 });
        assert_eq!(
            storage.count_outstanding_reviews(a, reviewer).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_capped_insert_unknown_reviewer() {
        let storage = memory_storage().await;
        let roster = seed_individuals(&storage, assignment_request("ghost"), 2).await;
        let err = storage
            .insert_capped_review_mapping(roster.assignment.id, 9999, roster.teams[0].id, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, PeerReviewError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_submit_is_monotonic_and_frees_capacity() {
        let storage = memory_storage().await;
        let roster = seed_individuals(&storage, assignment_request("submit"), 3).await;
        let a = roster.assignment.id;
        let reviewer = roster.participants[0].id;

        let mapping = storage
            .insert_review_mapping(a, reviewer, roster.teams[1].id)
            .await
            .unwrap();
        assert_eq!(storage.count_outstanding_reviews(a, reviewer).await.unwrap(), 1);

        let first = storage
            .mark_review_submitted(a, mapping.id)
            .await
            .unwrap()
            .expect("mapping exists");
        assert!(first.submitted);
        let submitted_at = first.submitted_at;
        assert!(submitted_at.is_some());

        let second = storage
            .mark_review_submitted(a, mapping.id)
            .await
            .unwrap()
            .expect("mapping exists");
        assert_eq!(second.submitted_at, submitted_at);
        assert_eq!(storage.count_outstanding_reviews(a, reviewer).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_dependents() {
        let storage = memory_storage().await;
        let roster = seed_individuals(&storage, assignment_request("delete"), 3).await;
        let a = roster.assignment.id;
        let reviewer = roster.participants[0].id;

        let first = storage
            .insert_review_mapping(a, reviewer, roster.teams[1].id)
            .await
            .unwrap();
        storage
            .insert_review_mapping(a, reviewer, roster.teams[2].id)
            .await
            .unwrap();
        let calibration = storage
            .insert_calibration_mapping(a, reviewer, roster.teams[1].id)
            .await
            .unwrap();

        storage
            .create_review_dependent(first.id, DependentKind::Feedback, roster.participants[1].id)
            .await
            .unwrap();
        storage
            .create_review_dependent(first.id, DependentKind::Metareview, roster.participants[2].id)
            .await
            .unwrap();

        let deleted = storage
            .delete_reviews_for_reviewer(a, reviewer, false)
            .await
            .unwrap();
        assert_eq!(deleted.mappings, 2);
        assert_eq!(deleted.dependents, 2);

        // 校准映射保留
        let remaining = storage
            .list_review_mappings(
                a,
                ReviewMappingListQuery {
                    include_calibration: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, calibration.id);

        let none = storage.delete_review_mapping(a, first.id).await.unwrap();
        assert_eq!(none.mappings, 0);
    }

    #[tokio::test]
    async fn test_grade_records_comment() {
        let storage = memory_storage().await;
        let roster = seed_individuals(&storage, assignment_request("grade"), 2).await;
        let a = roster.assignment.id;
        let mapping = storage
            .insert_review_mapping(a, roster.participants[0].id, roster.teams[1].id)
            .await
            .unwrap();

        let graded = storage
            .grade_review_mapping(a, mapping.id, 87.5, Some("thorough".to_string()))
            .await
            .unwrap()
            .expect("mapping exists");
        assert_eq!(graded.instructor_grade, Some(87.5));
        assert_eq!(graded.instructor_comment.as_deref(), Some("thorough"));
        assert!(graded.graded_at.is_some());

        assert!(
            storage
                .grade_review_mapping(a + 1, mapping.id, 10.0, None)
                .await
                .unwrap()
                .is_none()
        );
    }
}
