use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::StreamExt;

use super::ReviewMappingService;
use crate::errors::{PeerReviewError, Result};
use crate::handler::BatchReport;
use crate::models::review_mappings::requests::{AssignRandomRequest, AssignRoundRobinRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;

fn batch_response(result: Result<BatchReport>) -> HttpResponse {
    match result {
        Ok(report) => {
            let message = format!(
                "已创建 {} 条评审映射，{} 条失败",
                report.created.len(),
                report.errors.len()
            );
            HttpResponse::Ok().json(ApiResponse::success(report, message))
        }
        Err(e) => error_response(
            &e,
            ErrorCode::AssignmentNotFound,
            ErrorCode::DuplicateReviewMapping,
        ),
    }
}

pub async fn assign_round_robin(
    service: &ReviewMappingService,
    request: &HttpRequest,
    assignment_id: i64,
    req: AssignRoundRobinRequest,
) -> ActixResult<HttpResponse> {
    let handler = service.handler(request);
    Ok(batch_response(
        handler
            .assign_round_robin(assignment_id, req.reviews_per_submission)
            .await,
    ))
}

pub async fn assign_random(
    service: &ReviewMappingService,
    request: &HttpRequest,
    assignment_id: i64,
    req: AssignRandomRequest,
) -> ActixResult<HttpResponse> {
    let handler = service.handler(request);
    Ok(batch_response(
        handler
            .assign_randomly(assignment_id, req.reviews_per_submission, req.seed)
            .await,
    ))
}

pub async fn assign_from_csv(
    service: &ReviewMappingService,
    request: &HttpRequest,
    assignment_id: i64,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let bytes = match read_file_from_multipart(&mut payload).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::ImportFileMissing,
                "未找到文件字段 file",
            )));
        }
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::FileUploadFailed,
                format!("文件读取失败: {e}"),
            )));
        }
    };

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::ImportFileParseFailed,
                "CSV 文件必须为 UTF-8 编码",
            )));
        }
    };

    let handler = service.handler(request);
    match handler.assign_from_csv(assignment_id, &text).await {
        // 文件级校验失败（空文件、超出行数）
        Err(PeerReviewError::Validation(msg)) => Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ImportFileDataInvalid, msg))),
        result => Ok(batch_response(result)),
    }
}

/// 读取 file 字段的全部内容，缺少该字段时返回 None
async fn read_file_from_multipart(
    payload: &mut Multipart,
) -> std::result::Result<Option<Vec<u8>>, String> {
    let mut file_bytes = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| format!("读取字段失败: {e}"))?;
        if field.name() != Some("file") {
            continue;
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| format!("读取数据失败: {e}"))?;
            data.extend_from_slice(&chunk);
        }
        file_bytes = Some(data);
    }

    Ok(file_bytes)
}
