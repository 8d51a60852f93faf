//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

use sea_orm::{DbErr, SqlErr};

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_peer_review_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum PeerReviewError {
            $($variant(String),)*
        }

        impl PeerReviewError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(PeerReviewError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(PeerReviewError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(PeerReviewError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl PeerReviewError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        PeerReviewError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_peer_review_errors! {
    DatabaseConfig("E001", "Database Configuration Error"),
    DatabaseConnection("E002", "Database Connection Error"),
    DatabaseOperation("E003", "Database Operation Error"),
    FileOperation("E004", "File Operation Error"),
    Validation("E005", "Validation Error"),
    NotFound("E006", "Resource Not Found"),
    Conflict("E007", "Uniqueness Conflict"),
    Serialization("E008", "Serialization Error"),
    CsvParse("E009", "CSV Parse Error"),
}

impl PeerReviewError {
    /// 存储层不可用，当前请求只能失败
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PeerReviewError::DatabaseConfig(_)
                | PeerReviewError::DatabaseConnection(_)
                | PeerReviewError::DatabaseOperation(_)
        )
    }

    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 将数据库错误归类：唯一约束冲突单独报告，其他归为数据库操作错误
    pub fn from_db(err: DbErr, context: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                PeerReviewError::Conflict(format!("{context}: {detail}"))
            }
            _ => PeerReviewError::DatabaseOperation(format!("{context}: {err}")),
        }
    }
}

impl fmt::Display for PeerReviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for PeerReviewError {}

// 为常见的错误类型实现 From trait
impl From<DbErr> for PeerReviewError {
    fn from(err: DbErr) -> Self {
        PeerReviewError::from_db(err, "数据库操作失败")
    }
}

impl From<std::io::Error> for PeerReviewError {
    fn from(err: std::io::Error) -> Self {
        PeerReviewError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for PeerReviewError {
    fn from(err: serde_json::Error) -> Self {
        PeerReviewError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for PeerReviewError {
    fn from(err: csv::Error) -> Self {
        PeerReviewError::CsvParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PeerReviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(PeerReviewError::database_config("test").code(), "E001");
        assert_eq!(PeerReviewError::validation("test").code(), "E005");
        assert_eq!(PeerReviewError::conflict("test").code(), "E007");
        assert_eq!(PeerReviewError::csv_parse("test").code(), "E009");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            PeerReviewError::not_found("test").error_type(),
            "Resource Not Found"
        );
        assert_eq!(
            PeerReviewError::conflict("test").error_type(),
            "Uniqueness Conflict"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(PeerReviewError::database_operation("down").is_fatal());
        assert!(PeerReviewError::database_connection("down").is_fatal());
        assert!(!PeerReviewError::conflict("dup").is_fatal());
        assert!(!PeerReviewError::not_found("missing").is_fatal());
    }

    #[test]
    fn test_db_error_without_sql_detail_is_operation_error() {
        let err = PeerReviewError::from_db(DbErr::Custom("boom".into()), "插入评审映射失败");
        assert_eq!(err.code(), "E003");
        assert!(err.message().contains("插入评审映射失败"));
    }

    #[test]
    fn test_format_simple() {
        let err = PeerReviewError::validation("评分必须在 0 到 100 之间");
        let formatted = err.format_simple();
        assert!(formatted.contains("Validation Error"));
        assert!(formatted.contains("评分必须在 0 到 100 之间"));
    }
}
