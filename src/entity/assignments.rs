//! 作业实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub rounds_of_reviews: i32,
    pub reviews_per_submission: i32,
    pub calibration_enabled: bool,
    pub has_topics: bool,
    pub team_reviewing: bool,
    pub allow_self_review: bool,
    pub max_outstanding_reviews: Option<i32>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::participants::Entity")]
    Participants,
    #[sea_orm(has_many = "super::teams::Entity")]
    Teams,
    #[sea_orm(has_many = "super::topics::Entity")]
    Topics,
    #[sea_orm(has_many = "super::review_mappings::Entity")]
    ReviewMappings,
}

impl Related<super::participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl Related<super::teams::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teams.def()
    }
}

impl Related<super::topics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topics.def()
    }
}

impl Related<super::review_mappings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReviewMappings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_assignment(self) -> crate::models::assignments::entities::Assignment {
        use crate::models::assignments::entities::Assignment;
        use chrono::{DateTime, Utc};

        Assignment {
            id: self.id,
            name: self.name,
            rounds_of_reviews: self.rounds_of_reviews,
            reviews_per_submission: self.reviews_per_submission,
            calibration_enabled: self.calibration_enabled,
            has_topics: self.has_topics,
            team_reviewing: self.team_reviewing,
            allow_self_review: self.allow_self_review,
            max_outstanding_reviews: self.max_outstanding_reviews,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
