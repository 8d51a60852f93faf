pub mod assignments;
pub mod common;
pub mod review_mappings;

pub use common::error_code::ErrorCode;
pub use common::response::{ApiResponse, ResponseStatus};

// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}
