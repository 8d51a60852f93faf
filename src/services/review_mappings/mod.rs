pub mod audit;
pub mod batch;
pub mod calibration;
pub mod delete;
pub mod dependents;
pub mod dynamic;
pub mod grade;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::config::{AppConfig, ReviewConfig};
use crate::handler::ReviewMappingHandler;
use crate::models::review_mappings::requests::{
    AssignRandomRequest, AssignRoundRobinRequest, CapacityQuery, CreateDependentRequest,
    DeleteAllForReviewerQuery, GradeReviewRequest, RequestReviewRequest,
    RequestTopicReviewRequest, ReviewMappingListQuery, SetCalibrationRequest,
};
use crate::storage::Storage;

pub struct ReviewMappingService {
    storage: Option<Arc<dyn Storage>>,
}

impl ReviewMappingService {
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

    /// 每个请求构建处理器，评审配置优先取 app data
    pub(crate) fn handler(&self, request: &HttpRequest) -> ReviewMappingHandler {
        let review = request
            .app_data::<web::Data<ReviewConfig>>()
            .map(|c| c.get_ref().clone())
            .unwrap_or_else(|| AppConfig::get().review.clone());
        ReviewMappingHandler::new(self.get_storage(request), review)
    }

    pub async fn assign_round_robin(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        req: AssignRoundRobinRequest,
    ) -> ActixResult<HttpResponse> {
        batch::assign_round_robin(self, request, assignment_id, req).await
    }

    pub async fn assign_random(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        req: AssignRandomRequest,
    ) -> ActixResult<HttpResponse> {
        batch::assign_random(self, request, assignment_id, req).await
    }

    pub async fn assign_from_csv(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        batch::assign_from_csv(self, request, assignment_id, payload).await
    }

    pub async fn request_review_fewest(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        req: RequestReviewRequest,
    ) -> ActixResult<HttpResponse> {
        dynamic::request_review_fewest(self, request, assignment_id, req).await
    }

    pub async fn request_review_topic_balance(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        req: RequestTopicReviewRequest,
    ) -> ActixResult<HttpResponse> {
        dynamic::request_review_topic_balance(self, request, assignment_id, req).await
    }

    pub async fn set_calibration_artifact(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        req: SetCalibrationRequest,
    ) -> ActixResult<HttpResponse> {
        calibration::set_calibration_artifact(self, request, assignment_id, req).await
    }

    pub async fn delete_review_mapping(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        mapping_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::delete_review_mapping(self, request, assignment_id, mapping_id).await
    }

    pub async fn delete_all_for_reviewer(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        query: DeleteAllForReviewerQuery,
    ) -> ActixResult<HttpResponse> {
        delete::delete_all_for_reviewer(self, request, assignment_id, query).await
    }

    pub async fn grade_review(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        req: GradeReviewRequest,
    ) -> ActixResult<HttpResponse> {
        grade::grade_review(self, request, assignment_id, req).await
    }

    pub async fn submit_review(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        mapping_id: i64,
    ) -> ActixResult<HttpResponse> {
        grade::submit_review(self, request, assignment_id, mapping_id).await
    }

    pub async fn create_dependent(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        mapping_id: i64,
        req: CreateDependentRequest,
    ) -> ActixResult<HttpResponse> {
        dependents::create_dependent(self, request, assignment_id, mapping_id, req).await
    }

    pub async fn list_review_mappings(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        query: ReviewMappingListQuery,
    ) -> ActixResult<HttpResponse> {
        audit::list_review_mappings(self, request, assignment_id, query).await
    }

    pub async fn workload_summary(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        audit::workload_summary(self, request, assignment_id).await
    }

    pub async fn capacity(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        query: CapacityQuery,
    ) -> ActixResult<HttpResponse> {
        audit::capacity(self, request, assignment_id, query).await
    }
}
