pub mod create;
pub mod get;
pub mod roster;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::models::assignments::requests::{
    CreateAssignmentRequest, CreateParticipantRequest, CreateTeamRequest, CreateTopicRequest,
    TopicSignupRequest, UpdateAssignmentRequest,
};
use crate::storage::Storage;

pub struct AssignmentService {
    storage: Option<Arc<dyn Storage>>,
}

impl AssignmentService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub async fn create_assignment(
        &self,
        request: &HttpRequest,
        req: CreateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_assignment(self, request, req).await
    }

    pub async fn get_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        get::get_assignment(self, request, assignment_id).await
    }

    pub async fn update_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        req: UpdateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_assignment(self, request, assignment_id, req).await
    }

    pub async fn add_participant(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        req: CreateParticipantRequest,
    ) -> ActixResult<HttpResponse> {
        roster::add_participant(self, request, assignment_id, req).await
    }

    pub async fn add_team(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        req: CreateTeamRequest,
    ) -> ActixResult<HttpResponse> {
        roster::add_team(self, request, assignment_id, req).await
    }

    pub async fn add_topic(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        req: CreateTopicRequest,
    ) -> ActixResult<HttpResponse> {
        roster::add_topic(self, request, assignment_id, req).await
    }

    pub async fn sign_up_team(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        topic_id: i64,
        req: TopicSignupRequest,
    ) -> ActixResult<HttpResponse> {
        roster::sign_up_team(self, request, assignment_id, topic_id, req).await
    }
}
