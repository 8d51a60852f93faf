//! 评审从属记录实体（对评审的反馈、元评审）

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "review_dependents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub review_mapping_id: i64,
    pub kind: String,
    pub reviewer_id: i64,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::review_mappings::Entity",
        from = "Column::ReviewMappingId",
        to = "super::review_mappings::Column::Id"
    )]
    ReviewMapping,
}

impl Related<super::review_mappings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReviewMapping.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_review_dependent(
        self,
    ) -> crate::models::review_mappings::entities::ReviewDependent {
        use crate::models::review_mappings::entities::{DependentKind, ReviewDependent};
        use chrono::{DateTime, Utc};

        ReviewDependent {
            id: self.id,
            review_mapping_id: self.review_mapping_id,
            kind: self.kind.parse().unwrap_or(DependentKind::Feedback),
            reviewer_id: self.reviewer_id,
            created_at: DateTime::<Utc>::from_timestamp_millis(self.created_at).unwrap_or_default(),
        }
    }
}
