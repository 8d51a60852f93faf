use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建评审映射表
        manager
            .create_table(
                Table::create()
                    .table(ReviewMappings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReviewMappings::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReviewMappings::AssignmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReviewMappings::ReviewerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReviewMappings::RevieweeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReviewMappings::IsCalibration)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    // 普通映射为 0，校准映射为 NULL；NULL 不参与唯一索引比较
                    .col(
                        ColumnDef::new(ReviewMappings::OrdinarySlot)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReviewMappings::Submitted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ReviewMappings::SubmittedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReviewMappings::InstructorGrade)
                            .double()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ReviewMappings::InstructorComment)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(ReviewMappings::GradedAt).big_integer().null())
                    .col(
                        ColumnDef::new(ReviewMappings::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ReviewMappings::Table, ReviewMappings::AssignmentId)
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ReviewMappings::Table, ReviewMappings::RevieweeId)
                            .to(Teams::Table, Teams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建评审从属记录表（反馈、元评审）
        manager
            .create_table(
                Table::create()
                    .table(ReviewDependents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReviewDependents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReviewDependents::ReviewMappingId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReviewDependents::Kind).string().not_null())
                    .col(
                        ColumnDef::new(ReviewDependents::ReviewerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReviewDependents::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ReviewDependents::Table, ReviewDependents::ReviewMappingId)
                            .to(ReviewMappings::Table, ReviewMappings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一作业内同一评审者对同一被评审团队至多一条普通映射
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_review_mappings_ordinary_edge")
                    .table(ReviewMappings::Table)
                    .col(ReviewMappings::AssignmentId)
                    .col(ReviewMappings::ReviewerId)
                    .col(ReviewMappings::RevieweeId)
                    .col(ReviewMappings::OrdinarySlot)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_review_mappings_assignment_reviewee")
                    .table(ReviewMappings::Table)
                    .col(ReviewMappings::AssignmentId)
                    .col(ReviewMappings::RevieweeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_review_dependents_mapping_id")
                    .table(ReviewDependents::Table)
                    .col(ReviewDependents::ReviewMappingId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReviewDependents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ReviewMappings::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Assignments {
    #[sea_orm(iden = "assignments")]
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Teams {
    #[sea_orm(iden = "teams")]
    Table,
    Id,
}

#[derive(DeriveIden)]
enum ReviewMappings {
    #[sea_orm(iden = "review_mappings")]
    Table,
    Id,
    AssignmentId,
    ReviewerId,
    RevieweeId,
    IsCalibration,
    OrdinarySlot,
    Submitted,
    SubmittedAt,
    InstructorGrade,
    InstructorComment,
    GradedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ReviewDependents {
    #[sea_orm(iden = "review_dependents")]
    Table,
    Id,
    ReviewMappingId,
    Kind,
    ReviewerId,
    CreatedAt,
}
