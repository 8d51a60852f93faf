use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewMapping {
    pub id: i64,
    pub assignment_id: i64,
    // 参与者 ID，团队评审时为团队 ID
    pub reviewer_id: i64,
    // 被评审团队 ID
    pub reviewee_id: i64,
    pub is_calibration: bool,
    pub submitted: bool,
    pub submitted_at: Option<DateTime<Utc>>,
    pub instructor_grade: Option<f64>,
    pub instructor_comment: Option<String>,
    pub graded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// 从属记录类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependentKind {
    Feedback,
    Metareview,
}

impl DependentKind {
    pub const FEEDBACK: &'static str = "feedback";
    pub const METAREVIEW: &'static str = "metareview";
}

impl std::fmt::Display for DependentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DependentKind::Feedback => write!(f, "{}", DependentKind::FEEDBACK),
            DependentKind::Metareview => write!(f, "{}", DependentKind::METAREVIEW),
        }
    }
}

impl std::str::FromStr for DependentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            DependentKind::FEEDBACK => Ok(DependentKind::Feedback),
            DependentKind::METAREVIEW => Ok(DependentKind::Metareview),
            _ => Err(format!("Invalid dependent kind: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDependent {
    pub id: i64,
    pub review_mapping_id: i64,
    pub kind: DependentKind,
    pub reviewer_id: i64,
    pub created_at: DateTime<Utc>,
}

/// 删除操作的统计结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedMappings {
    pub mappings: u64,
    pub dependents: u64,
}
