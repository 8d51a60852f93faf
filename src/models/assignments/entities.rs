use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    // 唯一 ID
    pub id: i64,
    // 作业名称
    pub name: String,
    // 评审轮数
    pub rounds_of_reviews: i32,
    // 批量分配时每份提交的默认评审数
    pub reviews_per_submission: i32,
    // 是否启用校准评审
    pub calibration_enabled: bool,
    // 是否按选题报名
    pub has_topics: bool,
    // 评审者是否为团队
    pub team_reviewing: bool,
    // 是否允许评审自己的提交
    pub allow_self_review: bool,
    // 未提交评审数上限（覆盖全局默认值）
    pub max_outstanding_reviews: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    pub assignment_id: i64,
    // 作业内唯一标识，CSV 导入按此解析
    pub handle: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub assignment_id: i64,
    // 作业内唯一，CSV 导入按此解析
    pub name: String,
    // 校准样例不会成为普通评审对象
    pub is_calibration_artifact: bool,
    pub member_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub assignment_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSignup {
    pub id: i64,
    pub topic_id: i64,
    pub team_id: i64,
}
