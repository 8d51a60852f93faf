use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ReviewMappingService;
use crate::models::review_mappings::requests::CreateDependentRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;

pub async fn create_dependent(
    service: &ReviewMappingService,
    request: &HttpRequest,
    assignment_id: i64,
    mapping_id: i64,
    req: CreateDependentRequest,
) -> ActixResult<HttpResponse> {
    let handler = service.handler(request);

    match handler
        .add_dependent(assignment_id, mapping_id, req.kind, req.reviewer_id)
        .await
    {
        Ok(dependent) => {
            Ok(HttpResponse::Created().json(ApiResponse::success(dependent, "从属记录已创建")))
        }
        Err(e) => Ok(error_response(
            &e,
            ErrorCode::ReviewMappingNotFound,
            ErrorCode::Conflict,
        )),
    }
}
