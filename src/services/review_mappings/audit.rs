use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ReviewMappingService;
use crate::models::review_mappings::{
    requests::{CapacityQuery, ReviewMappingListQuery},
    responses::ReviewMappingListResponse,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;

pub async fn list_review_mappings(
    service: &ReviewMappingService,
    request: &HttpRequest,
    assignment_id: i64,
    query: ReviewMappingListQuery,
) -> ActixResult<HttpResponse> {
    let handler = service.handler(request);

    match handler.list_review_mappings(assignment_id, query).await {
        Ok(items) => {
            let total = items.len();
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                ReviewMappingListResponse { items, total },
                "获取成功",
            )))
        }
        Err(e) => Ok(error_response(
            &e,
            ErrorCode::AssignmentNotFound,
            ErrorCode::Conflict,
        )),
    }
}

pub async fn workload_summary(
    service: &ReviewMappingService,
    request: &HttpRequest,
    assignment_id: i64,
) -> ActixResult<HttpResponse> {
    let handler = service.handler(request);

    match handler.workload_summary(assignment_id).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::success(summary, "获取成功"))),
        Err(e) => Ok(error_response(
            &e,
            ErrorCode::AssignmentNotFound,
            ErrorCode::Conflict,
        )),
    }
}

pub async fn capacity(
    service: &ReviewMappingService,
    request: &HttpRequest,
    assignment_id: i64,
    query: CapacityQuery,
) -> ActixResult<HttpResponse> {
    let handler = service.handler(request);

    match handler
        .can_accept_more_reviews(assignment_id, query.reviewer_id, query.max_outstanding)
        .await
    {
        Ok(check) => Ok(HttpResponse::Ok().json(ApiResponse::success(check, "获取成功"))),
        Err(e) => Ok(error_response(&e, ErrorCode::NotFound, ErrorCode::Conflict)),
    }
}
