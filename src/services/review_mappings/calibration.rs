use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ReviewMappingService;
use crate::errors::PeerReviewError;
use crate::models::review_mappings::requests::SetCalibrationRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;

pub async fn set_calibration_artifact(
    service: &ReviewMappingService,
    request: &HttpRequest,
    assignment_id: i64,
    req: SetCalibrationRequest,
) -> ActixResult<HttpResponse> {
    let handler = service.handler(request);

    match handler
        .assign_calibration_review(assignment_id, req.reviewer_id, req.submission_id)
        .await
    {
        Ok(mapping) => Ok(HttpResponse::Ok().json(ApiResponse::success(mapping, "校准评审已创建"))),
        Err(PeerReviewError::Validation(msg)) => Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::CalibrationDisabled, msg))),
        Err(e) => Ok(error_response(
            &e,
            ErrorCode::NotFound,
            ErrorCode::DuplicateReviewMapping,
        )),
    }
}
