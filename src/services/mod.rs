pub mod assignments;
pub mod review_mappings;

pub use assignments::AssignmentService;
pub use review_mappings::ReviewMappingService;

use actix_web::HttpResponse;
use tracing::error;

use crate::errors::PeerReviewError;
use crate::models::{ApiResponse, ErrorCode};

/// 将处理器错误转换为 HTTP 响应
///
/// `not_found` 与 `conflict` 由调用方给出具体业务码。
pub(crate) fn error_response(
    err: &PeerReviewError,
    not_found: ErrorCode,
    conflict: ErrorCode,
) -> HttpResponse {
    match err {
        PeerReviewError::NotFound(msg) => {
            HttpResponse::NotFound().json(ApiResponse::error_empty(not_found, msg.as_str()))
        }
        PeerReviewError::Validation(msg) => {
            HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, msg.as_str()))
        }
        PeerReviewError::Conflict(msg) => {
            HttpResponse::Conflict().json(ApiResponse::error_empty(conflict, msg.as_str()))
        }
        PeerReviewError::CsvParse(msg) => HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ImportFileParseFailed,
            format!("CSV 解析失败: {msg}"),
        )),
        other => {
            error!("{}", other);
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                other.format_simple(),
            ))
        }
    }
}
