//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod assignments;
mod review_mappings;
mod roster;
mod snapshot;

use crate::config::AppConfig;
use crate::errors::{PeerReviewError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        let storage = Self::from_connection(db).await?;
        info!("SeaORM 存储初始化完成，数据库: {}", db_url);
        Ok(storage)
    }

    /// 基于已有连接创建存储并运行迁移
    pub async fn from_connection(db: DatabaseConnection) -> Result<Self> {
        Migrator::up(&db, None)
            .await
            .map_err(|e| PeerReviewError::database_operation(format!("数据库迁移失败: {e}")))?;
        Ok(Self { db })
    }

    /// 单连接的内存 SQLite，事务内外共用同一连接
    pub async fn in_memory() -> Result<Self> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);

        let db = Database::connect(opt).await.map_err(|e| {
            PeerReviewError::database_connection(format!("无法创建内存数据库: {e}"))
        })?;
        Self::from_connection(db).await
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| PeerReviewError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| PeerReviewError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(2)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| PeerReviewError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(PeerReviewError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }

    pub(crate) fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

// Storage trait 实现
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
use crate::storage::{CappedInsert, Storage};
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 作业模块
    async fn create_assignment(&self, req: CreateAssignmentRequest) -> Result<Assignment> {
        self.create_assignment_impl(req).await
    }

    async fn get_assignment(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        self.get_assignment_impl(assignment_id).await
    }

    async fn update_assignment(
        &self,
        assignment_id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Option<Assignment>> {
        self.update_assignment_impl(assignment_id, update).await
    }

    // 名单模块
    async fn create_participant(
        &self,
        assignment_id: i64,
        req: CreateParticipantRequest,
    ) -> Result<Participant> {
        self.create_participant_impl(assignment_id, req).await
    }

    async fn create_team(&self, assignment_id: i64, req: CreateTeamRequest) -> Result<Team> {
        self.create_team_impl(assignment_id, req).await
    }

    async fn get_team(&self, assignment_id: i64, team_id: i64) -> Result<Option<Team>> {
        self.get_team_impl(assignment_id, team_id).await
    }

    async fn create_topic(&self, assignment_id: i64, req: CreateTopicRequest) -> Result<Topic> {
        self.create_topic_impl(assignment_id, req).await
    }

    async fn sign_up_team(
        &self,
        assignment_id: i64,
        topic_id: i64,
        team_id: i64,
    ) -> Result<TopicSignup> {
        self.sign_up_team_impl(assignment_id, topic_id, team_id)
            .await
    }

    async fn reviewer_exists(&self, assignment: &Assignment, reviewer_id: i64) -> Result<bool> {
        self.reviewer_exists_impl(assignment, reviewer_id).await
    }

    // 快照
    async fn load_snapshot_parts(&self, assignment_id: i64) -> Result<Option<SnapshotParts>> {
        self.load_snapshot_parts_impl(assignment_id).await
    }

    // 评审映射模块
    async fn insert_review_mapping(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
        reviewee_id: i64,
    ) -> Result<ReviewMapping> {
        self.insert_review_mapping_impl(assignment_id, reviewer_id, reviewee_id)
            .await
    }

    async fn insert_capped_review_mapping(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
        reviewee_id: i64,
        cap: u32,
    ) -> Result<CappedInsert> {
        self.insert_capped_review_mapping_impl(assignment_id, reviewer_id, reviewee_id, cap)
            .await
    }

    async fn insert_calibration_mapping(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
        reviewee_id: i64,
    ) -> Result<ReviewMapping> {
        self.insert_calibration_mapping_impl(assignment_id, reviewer_id, reviewee_id)
            .await
    }

    async fn count_outstanding_reviews(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
    ) -> Result<u64> {
        self.count_outstanding_reviews_impl(assignment_id, reviewer_id)
            .await
    }

    async fn get_review_mapping(
        &self,
        assignment_id: i64,
        mapping_id: i64,
    ) -> Result<Option<ReviewMapping>> {
        self.get_review_mapping_impl(assignment_id, mapping_id)
            .await
    }

    async fn list_review_mappings(
        &self,
        assignment_id: i64,
        query: ReviewMappingListQuery,
    ) -> Result<Vec<ReviewMapping>> {
        self.list_review_mappings_impl(assignment_id, query).await
    }

    async fn delete_review_mapping(
        &self,
        assignment_id: i64,
        mapping_id: i64,
    ) -> Result<DeletedMappings> {
        self.delete_review_mapping_impl(assignment_id, mapping_id)
            .await
    }

    async fn delete_reviews_for_reviewer(
        &self,
        assignment_id: i64,
        reviewer_id: i64,
        include_calibration: bool,
    ) -> Result<DeletedMappings> {
        self.delete_reviews_for_reviewer_impl(assignment_id, reviewer_id, include_calibration)
            .await
    }

    async fn grade_review_mapping(
        &self,
        assignment_id: i64,
        mapping_id: i64,
        grade: f64,
        comment: Option<String>,
    ) -> Result<Option<ReviewMapping>> {
        self.grade_review_mapping_impl(assignment_id, mapping_id, grade, comment)
            .await
    }

    async fn mark_review_submitted(
        &self,
        assignment_id: i64,
        mapping_id: i64,
    ) -> Result<Option<ReviewMapping>> {
        self.mark_review_submitted_impl(assignment_id, mapping_id)
            .await
    }

    async fn create_review_dependent(
        &self,
        mapping_id: i64,
        kind: DependentKind,
        reviewer_id: i64,
    ) -> Result<ReviewDependent> {
        self.create_review_dependent_impl(mapping_id, kind, reviewer_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_database_url() {
        assert_eq!(
            SeaOrmStorage::build_database_url("peer_review.db").unwrap(),
            "sqlite://peer_review.db?mode=rwc"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url("postgres://u:p@localhost/db").unwrap(),
            "postgres://u:p@localhost/db"
        );
        assert!(SeaOrmStorage::build_database_url("redis://localhost").is_err());
    }
}
