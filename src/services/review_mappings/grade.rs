use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ReviewMappingService;
use crate::errors::PeerReviewError;
use crate::models::review_mappings::requests::GradeReviewRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;

pub async fn grade_review(
    service: &ReviewMappingService,
    request: &HttpRequest,
    assignment_id: i64,
    req: GradeReviewRequest,
) -> ActixResult<HttpResponse> {
    let handler = service.handler(request);

    match handler
        .grade_review(assignment_id, req.mapping_id, req.grade, req.comment)
        .await
    {
        Ok(mapping) => Ok(HttpResponse::Ok().json(ApiResponse::success(mapping, "评分已记录"))),
        Err(PeerReviewError::Validation(msg)) => Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::GradeInvalid, msg))),
        Err(e) => Ok(error_response(
            &e,
            ErrorCode::ReviewMappingNotFound,
            ErrorCode::Conflict,
        )),
    }
}

// 评审提交回调
pub async fn submit_review(
    service: &ReviewMappingService,
    request: &HttpRequest,
    assignment_id: i64,
    mapping_id: i64,
) -> ActixResult<HttpResponse> {
    let handler = service.handler(request);

    match handler.submit_review(assignment_id, mapping_id).await {
        Ok(mapping) => Ok(HttpResponse::Ok().json(ApiResponse::success(mapping, "评审已提交"))),
        Err(e) => Ok(error_response(
            &e,
            ErrorCode::ReviewMappingNotFound,
            ErrorCode::Conflict,
        )),
    }
}
