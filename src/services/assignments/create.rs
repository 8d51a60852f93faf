use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::AssignmentService;
use crate::models::assignments::requests::CreateAssignmentRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;

pub async fn create_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    req: CreateAssignmentRequest,
) -> ActixResult<HttpResponse> {
    if let Err(msg) = req.validate() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::AssignmentConfigInvalid,
            msg,
        )));
    }

    let storage = service.get_storage(request);
    match storage.create_assignment(req).await {
        Ok(assignment) => {
            info!("Assignment {} ({}) created", assignment.id, assignment.name);
            Ok(HttpResponse::Created().json(ApiResponse::success(assignment, "作业已创建")))
        }
        Err(e) => Ok(error_response(
            &e,
            ErrorCode::AssignmentNotFound,
            ErrorCode::Conflict,
        )),
    }
}
