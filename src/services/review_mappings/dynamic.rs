use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ReviewMappingService;
use crate::errors::Result;
use crate::handler::DynamicOutcome;
use crate::models::review_mappings::{
    requests::{RequestReviewRequest, RequestTopicReviewRequest},
    responses::{CapacityRefusal, DynamicAssignResponse},
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;

/// 动态分配结果：成功 200，无容量与无可选对象均为 422 但业务码不同
fn dynamic_response(result: Result<DynamicOutcome>) -> HttpResponse {
    match result {
        Ok(DynamicOutcome::Assigned(mapping)) => HttpResponse::Ok().json(ApiResponse::success(
            DynamicAssignResponse {
                mapping_id: mapping.id,
                reviewee_id: mapping.reviewee_id,
                mapping,
            },
            "评审已分配",
        )),
        Ok(DynamicOutcome::NoCapacity { outstanding, cap }) => HttpResponse::UnprocessableEntity()
            .json(ApiResponse::error(
                ErrorCode::ReviewCapacityExhausted,
                CapacityRefusal { outstanding, cap },
                format!("已有 {outstanding} 份未提交评审，达到上限 {cap}，请先提交后再请求"),
            )),
        Ok(DynamicOutcome::NothingEligible) => HttpResponse::UnprocessableEntity().json(
            ApiResponse::error_empty(ErrorCode::NoEligibleReviewee, "当前没有可分配的提交"),
        ),
        Err(e) => error_response(&e, ErrorCode::NotFound, ErrorCode::DuplicateReviewMapping),
    }
}

pub async fn request_review_fewest(
    service: &ReviewMappingService,
    request: &HttpRequest,
    assignment_id: i64,
    req: RequestReviewRequest,
) -> ActixResult<HttpResponse> {
    let handler = service.handler(request);
    Ok(dynamic_response(
        handler
            .assign_least_reviewed(assignment_id, req.reviewer_id, req.max_outstanding)
            .await,
    ))
}

pub async fn request_review_topic_balance(
    service: &ReviewMappingService,
    request: &HttpRequest,
    assignment_id: i64,
    req: RequestTopicReviewRequest,
) -> ActixResult<HttpResponse> {
    let handler = service.handler(request);
    Ok(dynamic_response(
        handler
            .assign_dynamic_topic_fairly(assignment_id, req.reviewer_id, req.k, req.max_outstanding)
            .await,
    ))
}
