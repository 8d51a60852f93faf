use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ReviewMappingService;
use crate::models::review_mappings::requests::DeleteAllForReviewerQuery;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;

pub async fn delete_review_mapping(
    service: &ReviewMappingService,
    request: &HttpRequest,
    assignment_id: i64,
    mapping_id: i64,
) -> ActixResult<HttpResponse> {
    let handler = service.handler(request);

    match handler.delete_review_mapping(assignment_id, mapping_id).await {
        Ok(deleted) => Ok(HttpResponse::Ok().json(ApiResponse::success(deleted, "评审映射已删除"))),
        Err(e) => Ok(error_response(
            &e,
            ErrorCode::ReviewMappingNotFound,
            ErrorCode::Conflict,
        )),
    }
}

pub async fn delete_all_for_reviewer(
    service: &ReviewMappingService,
    request: &HttpRequest,
    assignment_id: i64,
    query: DeleteAllForReviewerQuery,
) -> ActixResult<HttpResponse> {
    let handler = service.handler(request);

    match handler
        .delete_all_reviews_for(assignment_id, query.reviewer_id, query.include_calibration)
        .await
    {
        Ok(deleted) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            deleted,
            format!("已删除 {} 条评审映射", deleted.mappings),
        ))),
        Err(e) => Ok(error_response(
            &e,
            ErrorCode::AssignmentNotFound,
            ErrorCode::Conflict,
        )),
    }
}
