use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::RateLimit;
use crate::models::review_mappings::requests::{
    AssignRandomRequest, AssignRoundRobinRequest, CapacityQuery, CreateDependentRequest,
    DeleteAllForReviewerQuery, GradeReviewRequest, RequestReviewRequest,
    RequestTopicReviewRequest, ReviewMappingListQuery, SetCalibrationRequest,
};
use crate::services::ReviewMappingService;

// 懒加载的全局 ReviewMappingService 实例
static REVIEW_MAPPING_SERVICE: Lazy<ReviewMappingService> =
    Lazy::new(ReviewMappingService::new_lazy);

// 轮转批量分配
pub async fn assign_round_robin(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<AssignRoundRobinRequest>,
) -> ActixResult<HttpResponse> {
    REVIEW_MAPPING_SERVICE
        .assign_round_robin(&req, path.into_inner(), body.into_inner())
        .await
}

// 随机批量分配
pub async fn assign_random(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<AssignRandomRequest>,
) -> ActixResult<HttpResponse> {
    REVIEW_MAPPING_SERVICE
        .assign_random(&req, path.into_inner(), body.into_inner())
        .await
}

// CSV 导入
pub async fn assign_from_csv(
    req: HttpRequest,
    path: web::Path<i64>,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    REVIEW_MAPPING_SERVICE
        .assign_from_csv(&req, path.into_inner(), payload)
        .await
}

// 请求评审数最少的提交
pub async fn request_review_fewest(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<RequestReviewRequest>,
) -> ActixResult<HttpResponse> {
    REVIEW_MAPPING_SERVICE
        .request_review_fewest(&req, path.into_inner(), body.into_inner())
        .await
}

// 按选题均衡请求评审
pub async fn request_review_topic_balance(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<RequestTopicReviewRequest>,
) -> ActixResult<HttpResponse> {
    REVIEW_MAPPING_SERVICE
        .request_review_topic_balance(&req, path.into_inner(), body.into_inner())
        .await
}

// 创建校准评审
pub async fn set_calibration_artifact(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<SetCalibrationRequest>,
) -> ActixResult<HttpResponse> {
    REVIEW_MAPPING_SERVICE
        .set_calibration_artifact(&req, path.into_inner(), body.into_inner())
        .await
}

// 删除评审者的全部映射
pub async fn delete_all_for_reviewer(
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<DeleteAllForReviewerQuery>,
) -> ActixResult<HttpResponse> {
    REVIEW_MAPPING_SERVICE
        .delete_all_for_reviewer(&req, path.into_inner(), query.into_inner())
        .await
}

// 教师评分
pub async fn grade_review(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<GradeReviewRequest>,
) -> ActixResult<HttpResponse> {
    REVIEW_MAPPING_SERVICE
        .grade_review(&req, path.into_inner(), body.into_inner())
        .await
}

// 列出映射
pub async fn list_review_mappings(
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<ReviewMappingListQuery>,
) -> ActixResult<HttpResponse> {
    REVIEW_MAPPING_SERVICE
        .list_review_mappings(&req, path.into_inner(), query.into_inner())
        .await
}

// 负载统计
pub async fn workload_summary(req: HttpRequest, path: web::Path<i64>) -> ActixResult<HttpResponse> {
    REVIEW_MAPPING_SERVICE
        .workload_summary(&req, path.into_inner())
        .await
}

// 评审者容量
pub async fn capacity(
    req: HttpRequest,
    path: web::Path<i64>,
    query: web::Query<CapacityQuery>,
) -> ActixResult<HttpResponse> {
    REVIEW_MAPPING_SERVICE
        .capacity(&req, path.into_inner(), query.into_inner())
        .await
}

// 删除单个映射
pub async fn delete_review_mapping(
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
) -> ActixResult<HttpResponse> {
    let (assignment_id, mapping_id) = path.into_inner();
    REVIEW_MAPPING_SERVICE
        .delete_review_mapping(&req, assignment_id, mapping_id)
        .await
}

// 提交评审
pub async fn submit_review(
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
) -> ActixResult<HttpResponse> {
    let (assignment_id, mapping_id) = path.into_inner();
    REVIEW_MAPPING_SERVICE
        .submit_review(&req, assignment_id, mapping_id)
        .await
}

// 创建反馈或元评审
pub async fn create_dependent(
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
    body: web::Json<CreateDependentRequest>,
) -> ActixResult<HttpResponse> {
    let (assignment_id, mapping_id) = path.into_inner();
    REVIEW_MAPPING_SERVICE
        .create_dependent(&req, assignment_id, mapping_id, body.into_inner())
        .await
}

// 配置路由
//
// 必须在 configure_assignments_routes 之前注册，否则会被 /api/v1/assignments 作用域先匹配
pub fn configure_review_mappings_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/assignments/{assignment_id}/review_mappings")
            .service(web::resource("").route(web::get().to(list_review_mappings)))
            .service(web::resource("/summary").route(web::get().to(workload_summary)))
            .service(web::resource("/capacity").route(web::get().to(capacity)))
            // 批量分配
            .service(
                web::resource("/assign_round_robin")
                    .wrap(RateLimit::batch_assign())
                    .route(web::post().to(assign_round_robin)),
            )
            .service(
                web::resource("/assign_random")
                    .wrap(RateLimit::batch_assign())
                    .route(web::post().to(assign_random)),
            )
            .service(
                web::resource("/assign_from_csv")
                    .wrap(RateLimit::batch_assign())
                    .route(web::post().to(assign_from_csv)),
            )
            // 动态分配
            .service(
                web::resource("/request_review_fewest")
                    .wrap(RateLimit::request_review())
                    .route(web::post().to(request_review_fewest)),
            )
            .service(
                web::resource("/request_review_topic_balance")
                    .wrap(RateLimit::request_review())
                    .route(web::post().to(request_review_topic_balance)),
            )
            .service(
                web::resource("/set_calibration_artifact")
                    .route(web::post().to(set_calibration_artifact)),
            )
            .service(
                web::resource("/delete_all_for_reviewer")
                    .route(web::delete().to(delete_all_for_reviewer)),
            )
            .service(web::resource("/grade_review").route(web::patch().to(grade_review)))
            // 字面路径需先于 /{id} 注册
            .service(web::resource("/{id}").route(web::delete().to(delete_review_mapping)))
            .service(web::resource("/{id}/submit").route(web::post().to(submit_review)))
            .service(web::resource("/{id}/dependents").route(web::post().to(create_dependent))),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReviewConfig;
    use crate::models::ErrorCode;
    use crate::routes::configure_assignments_routes;
    use crate::test_support::{assignment_request, memory_storage, seed_individuals};
    use actix_web::{App, http::StatusCode, test};
    use serde_json::{Value, json};

    macro_rules! init_app {
        ($storage:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($storage))
                    .app_data(web::Data::new(ReviewConfig::default()))
                    .configure(configure_review_mappings_routes)
                    .configure(configure_assignments_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_request_review_outcomes() {
        let storage = memory_storage().await;
        let roster = seed_individuals(&storage, assignment_request("http"), 2).await;
        let app = init_app!(storage);
        let uri = format!(
            "/api/v1/assignments/{}/review_mappings/request_review_fewest",
            roster.assignment.id
        );
        let reviewer = roster.participants[0].id;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&uri)
                .set_json(json!({ "reviewer_id": reviewer }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["data"]["reviewee_id"], roster.teams[1].id);
        assert!(body["data"]["mapping_id"].is_i64());

        // 唯一的可选团队已分配
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&uri)
                .set_json(json!({ "reviewer_id": reviewer, "max_outstanding": 5 }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], ErrorCode::NoEligibleReviewee as i32);

        // 上限为 1 时被拒绝，业务码不同
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&uri)
                .set_json(json!({ "reviewer_id": reviewer, "max_outstanding": 1 }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], ErrorCode::ReviewCapacityExhausted as i32);
        assert_eq!(body["data"]["outstanding"], 1);

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&uri)
                .set_json(json!({ "reviewer_id": 9999 }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_round_robin_then_delete_and_summary() {
        let storage = memory_storage().await;
        let roster = seed_individuals(&storage, assignment_request("http-rr"), 3).await;
        let app = init_app!(storage);
        let base = format!("/api/v1/assignments/{}/review_mappings", roster.assignment.id);

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("{base}/assign_round_robin"))
                .set_json(json!({}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["data"]["strategy"], "round_robin");
        let created = body["data"]["created"].as_array().unwrap().clone();
        assert_eq!(created.len(), 6);

        let first = created[0].as_i64().unwrap();
        let res = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!("{base}/{first}"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!("{base}/{first}"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri(&format!("{base}/summary")).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["data"]["reviewers"].as_array().unwrap().len(), 3);

        let res = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!(
                    "{base}/delete_all_for_reviewer?reviewer_id={}",
                    roster.participants[0].id
                ))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_unknown_assignment_and_bad_grade() {
        let storage = memory_storage().await;
        let roster = seed_individuals(&storage, assignment_request("http-grade"), 2).await;
        let mapping = storage
            .insert_review_mapping(
                roster.assignment.id,
                roster.participants[0].id,
                roster.teams[1].id,
            )
            .await
            .unwrap();
        let app = init_app!(storage);

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/assignments/777/review_mappings/assign_random")
                .set_json(json!({ "seed": 1 }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = test::call_service(
            &app,
            test::TestRequest::patch()
                .uri(&format!(
                    "/api/v1/assignments/{}/review_mappings/grade_review",
                    roster.assignment.id
                ))
                .set_json(json!({ "mapping_id": mapping.id, "grade": 140.0 }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        // 作业路由与评审映射路由同时可用
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/v1/assignments/{}", roster.assignment.id))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_roster_lookups_use_generic_not_found() {
        let storage = memory_storage().await;
        let roster = seed_individuals(&storage, assignment_request("signup"), 2).await;
        let app = init_app!(storage);

        // 选题与团队分属不同实体，统一返回通用 NotFound
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!(
                    "/api/v1/assignments/{}/topics/9999/signups",
                    roster.assignment.id
                ))
                .set_json(json!({ "team_id": roster.teams[0].id }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], ErrorCode::NotFound as i32);

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!(
                    "/api/v1/assignments/{}/review_mappings/request_review_fewest",
                    roster.assignment.id
                ))
                .set_json(json!({ "reviewer_id": 9999 }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], ErrorCode::NotFound as i32);
    }
}
