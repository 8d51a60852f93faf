use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::models::assignments::requests::{
    CreateAssignmentRequest, CreateParticipantRequest, CreateTeamRequest, CreateTopicRequest,
    TopicSignupRequest, UpdateAssignmentRequest,
};
use crate::services::AssignmentService;

// 懒加载的全局 AssignmentService 实例
static ASSIGNMENT_SERVICE: Lazy<AssignmentService> = Lazy::new(AssignmentService::new_lazy);

// 创建作业
pub async fn create_assignment(
    req: HttpRequest,
    body: web::Json<CreateAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .create_assignment(&req, body.into_inner())
        .await
}

// 获取作业配置
pub async fn get_assignment(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .get_assignment(&req, path.into_inner())
        .await
}

// 更新作业配置
pub async fn update_assignment(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .update_assignment(&req, path.into_inner(), body.into_inner())
        .await
}

// 添加参与者
pub async fn add_participant(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<CreateParticipantRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .add_participant(&req, path.into_inner(), body.into_inner())
        .await
}

// 创建团队
pub async fn add_team(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<CreateTeamRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .add_team(&req, path.into_inner(), body.into_inner())
        .await
}

// 创建选题
pub async fn add_topic(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<CreateTopicRequest>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .add_topic(&req, path.into_inner(), body.into_inner())
        .await
}

// 团队报名选题
pub async fn sign_up_team(
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
    body: web::Json<TopicSignupRequest>,
) -> ActixResult<HttpResponse> {
    let (assignment_id, topic_id) = path.into_inner();
    ASSIGNMENT_SERVICE
        .sign_up_team(&req, assignment_id, topic_id, body.into_inner())
        .await
}

// 配置路由
pub fn configure_assignments_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/assignments")
            .service(web::resource("").route(web::post().to(create_assignment)))
            .service(
                web::resource("/{assignment_id}")
                    .route(web::get().to(get_assignment))
                    .route(web::patch().to(update_assignment)),
            )
            .service(
                web::resource("/{assignment_id}/participants")
                    .route(web::post().to(add_participant)),
            )
            .service(web::resource("/{assignment_id}/teams").route(web::post().to(add_team)))
            .service(web::resource("/{assignment_id}/topics").route(web::post().to(add_topic)))
            .service(
                web::resource("/{assignment_id}/topics/{topic_id}/signups")
                    .route(web::post().to(sign_up_team)),
            ),
    );
}
