use serde::Deserialize;

/// 创建作业请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAssignmentRequest {
    pub name: String,
    pub rounds_of_reviews: Option<i32>,
    pub reviews_per_submission: Option<i32>,
    pub calibration_enabled: Option<bool>,
    pub has_topics: Option<bool>,
    pub team_reviewing: Option<bool>,
    pub allow_self_review: Option<bool>,
    pub max_outstanding_reviews: Option<i32>,
}

/// 更新作业配置请求
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAssignmentRequest {
    pub name: Option<String>,
    pub rounds_of_reviews: Option<i32>,
    pub reviews_per_submission: Option<i32>,
    pub calibration_enabled: Option<bool>,
    pub has_topics: Option<bool>,
    pub team_reviewing: Option<bool>,
    pub allow_self_review: Option<bool>,
    pub max_outstanding_reviews: Option<i32>,
    /// 为 true 时清除作业级上限，回退到全局默认值
    #[serde(default)]
    pub clear_max_outstanding_reviews: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateParticipantRequest {
    pub handle: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<i64>,
    #[serde(default)]
    pub is_calibration_artifact: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTopicRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicSignupRequest {
    pub team_id: i64,
}

impl CreateAssignmentRequest {
    /// 校验作业配置取值范围
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Assignment name must not be empty".to_string());
        }
        validate_counts(
            self.rounds_of_reviews,
            self.reviews_per_submission,
            self.max_outstanding_reviews,
        )
    }
}

impl UpdateAssignmentRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err("Assignment name must not be empty".to_string());
        }
        validate_counts(
            self.rounds_of_reviews,
            self.reviews_per_submission,
            self.max_outstanding_reviews,
        )
    }
}

fn validate_counts(
    rounds: Option<i32>,
    per_submission: Option<i32>,
    max_outstanding: Option<i32>,
) -> Result<(), String> {
    if rounds.is_some_and(|v| v < 1) {
        return Err("rounds_of_reviews must be at least 1".to_string());
    }
    if per_submission.is_some_and(|v| v < 1) {
        return Err("reviews_per_submission must be at least 1".to_string());
    }
    if max_outstanding.is_some_and(|v| v < 1) {
        return Err("max_outstanding_reviews must be at least 1".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_assignment_validation() {
        let mut req = CreateAssignmentRequest {
            name: "Essay".to_string(),
            rounds_of_reviews: None,
            reviews_per_submission: Some(2),
            calibration_enabled: None,
            has_topics: None,
            team_reviewing: None,
            allow_self_review: None,
            max_outstanding_reviews: None,
        };
        assert!(req.validate().is_ok());

        req.reviews_per_submission = Some(0);
        assert!(req.validate().is_err());

        req.reviews_per_submission = Some(1);
        req.name = "   ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_rejects_zero_cap() {
        let req = UpdateAssignmentRequest {
            max_outstanding_reviews: Some(0),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
