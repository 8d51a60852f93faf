//! 名单录入：参与者、团队、选题与报名

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::AssignmentService;
use crate::models::assignments::requests::{
    CreateParticipantRequest, CreateTeamRequest, CreateTopicRequest, TopicSignupRequest,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;
use crate::storage::Storage;

fn blank_name(field: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::BadRequest,
        format!("{field} must not be empty"),
    ))
}

/// 名单写入前确认作业存在
async fn check_assignment(storage: &Arc<dyn Storage>, assignment_id: i64) -> Option<HttpResponse> {
    match storage.get_assignment(assignment_id).await {
        Ok(Some(_)) => None,
        Ok(None) => Some(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::AssignmentNotFound,
            "作业不存在",
        ))),
        Err(e) => Some(error_response(
            &e,
            ErrorCode::AssignmentNotFound,
            ErrorCode::Conflict,
        )),
    }
}

pub async fn add_participant(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    req: CreateParticipantRequest,
) -> ActixResult<HttpResponse> {
    if req.handle.trim().is_empty() {
        return Ok(blank_name("handle"));
    }

    let storage = service.get_storage(request);
    if let Some(resp) = check_assignment(&storage, assignment_id).await {
        return Ok(resp);
    }
    match storage.create_participant(assignment_id, req).await {
        Ok(participant) => {
            Ok(HttpResponse::Created().json(ApiResponse::success(participant, "参与者已添加")))
        }
        Err(e) => Ok(error_response(
            &e,
            ErrorCode::AssignmentNotFound,
            ErrorCode::RosterEntryExists,
        )),
    }
}

pub async fn add_team(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    req: CreateTeamRequest,
) -> ActixResult<HttpResponse> {
    if req.name.trim().is_empty() {
        return Ok(blank_name("name"));
    }

    let storage = service.get_storage(request);
    if let Some(resp) = check_assignment(&storage, assignment_id).await {
        return Ok(resp);
    }
    match storage.create_team(assignment_id, req).await {
        Ok(team) => Ok(HttpResponse::Created().json(ApiResponse::success(team, "团队已创建"))),
        Err(e) => Ok(error_response(
            &e,
            ErrorCode::AssignmentNotFound,
            ErrorCode::RosterEntryExists,
        )),
    }
}

pub async fn add_topic(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    req: CreateTopicRequest,
) -> ActixResult<HttpResponse> {
    if req.name.trim().is_empty() {
        return Ok(blank_name("name"));
    }

    let storage = service.get_storage(request);
    if let Some(resp) = check_assignment(&storage, assignment_id).await {
        return Ok(resp);
    }
    match storage.create_topic(assignment_id, req).await {
        Ok(topic) => Ok(HttpResponse::Created().json(ApiResponse::success(topic, "选题已创建"))),
        Err(e) => Ok(error_response(
            &e,
            ErrorCode::AssignmentNotFound,
            ErrorCode::RosterEntryExists,
        )),
    }
}

pub async fn sign_up_team(
    service: &AssignmentService,
    request: &HttpRequest,
    assignment_id: i64,
    topic_id: i64,
    req: TopicSignupRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    match storage.sign_up_team(assignment_id, topic_id, req.team_id).await {
        Ok(signup) => Ok(HttpResponse::Created().json(ApiResponse::success(signup, "报名成功"))),
        Err(e) => Ok(error_response(
            &e,
            ErrorCode::NotFound,
            ErrorCode::RosterEntryExists,
        )),
    }
}
