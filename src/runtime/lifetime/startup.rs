use crate::config::AppConfig;
use crate::storage::Storage;
use std::sync::Arc;
use tracing::{info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
}

/// 打印互评分配相关的生效配置
fn log_review_settings(config: &AppConfig) {
    let review = &config.review;
    info!(
        "Review settings: max outstanding {}, topic window {}, CSV row limit {}",
        review.default_max_outstanding, review.default_topic_window, review.max_csv_rows
    );
    info!(
        "Rate limits: {} review requests/min, {} batch runs/min",
        config.rate_limit.request_review_per_minute, config.rate_limit.batch_per_minute
    );
}

/// 准备服务器启动的上下文
/// 安装 TLS 提供者、连接数据库并执行迁移
pub async fn prepare_server_startup() -> StartupContext {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    log_review_settings(AppConfig::get());

    StartupContext { storage }
}
