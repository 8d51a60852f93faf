//! 评审映射实体（评审者 → 被评审团队）

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "review_mappings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub assignment_id: i64,
    pub reviewer_id: i64,
    pub reviewee_id: i64,
    pub is_calibration: bool,
    /// 普通映射固定为 0，校准映射为 NULL，配合唯一索引只约束普通映射
    pub ordinary_slot: Option<i32>,
    pub submitted: bool,
    pub submitted_at: Option<i64>,
    #[sea_orm(column_type = "Double", nullable)]
    pub instructor_grade: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub instructor_comment: Option<String>,
    pub graded_at: Option<i64>,
    /// 毫秒时间戳
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignments::Entity",
        from = "Column::AssignmentId",
        to = "super::assignments::Column::Id"
    )]
    Assignment,
    #[sea_orm(
        belongs_to = "super::teams::Entity",
        from = "Column::RevieweeId",
        to = "super::teams::Column::Id"
    )]
    Reviewee,
    #[sea_orm(has_many = "super::review_dependents::Entity")]
    Dependents,
}

impl Related<super::assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::teams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviewee.def()
    }
}

impl Related<super::review_dependents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dependents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// 普通映射在唯一索引中占用的槽位值
pub const ORDINARY_SLOT: i32 = 0;

impl Model {
    pub fn into_review_mapping(self) -> crate::models::review_mappings::entities::ReviewMapping {
        use crate::models::review_mappings::entities::ReviewMapping;
        use chrono::{DateTime, Utc};

        ReviewMapping {
            id: self.id,
            assignment_id: self.assignment_id,
            reviewer_id: self.reviewer_id,
            reviewee_id: self.reviewee_id,
            is_calibration: self.is_calibration,
            submitted: self.submitted,
            submitted_at: self
                .submitted_at
                .and_then(DateTime::<Utc>::from_timestamp_millis),
            instructor_grade: self.instructor_grade,
            instructor_comment: self.instructor_comment,
            graded_at: self.graded_at.and_then(DateTime::<Utc>::from_timestamp_millis),
            created_at: DateTime::<Utc>::from_timestamp_millis(self.created_at).unwrap_or_default(),
        }
    }
}
