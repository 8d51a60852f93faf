use serde::Deserialize;

use super::entities::DependentKind;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignRoundRobinRequest {
    pub reviews_per_submission: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignRandomRequest {
    pub reviews_per_submission: Option<u32>,
    pub seed: Option<u64>,
}

/// 评审者主动请求一份评审
#[derive(Debug, Clone, Deserialize)]
pub struct RequestReviewRequest {
    pub reviewer_id: i64,
    pub max_outstanding: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestTopicReviewRequest {
    pub reviewer_id: i64,
    // 考察的最少评审选题数
    pub k: Option<usize>,
    pub max_outstanding: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetCalibrationRequest {
    pub reviewer_id: i64,
    pub submission_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteAllForReviewerQuery {
    pub reviewer_id: i64,
    #[serde(default)]
    pub include_calibration: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GradeReviewRequest {
    pub mapping_id: i64,
    pub grade: f64,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewMappingListQuery {
    pub reviewer_id: Option<i64>,
    pub reviewee_id: Option<i64>,
    #[serde(default)]
    pub include_calibration: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CapacityQuery {
    pub reviewer_id: i64,
    pub max_outstanding: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDependentRequest {
    pub kind: DependentKind,
    pub reviewer_id: i64,
}
