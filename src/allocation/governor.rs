//! 未提交评审上限
//!
//! 动态分配前必须通过；批量分配不经过此检查。

use serde::Serialize;

use crate::config::ReviewConfig;
use crate::errors::{PeerReviewError, Result};
use crate::models::assignments::entities::Assignment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityCheck {
    pub outstanding: u64,
    pub cap: u32,
    pub allowed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutstandingReviewGovernor {
    cap: u32,
}

impl OutstandingReviewGovernor {
    pub fn new(cap: u32) -> Self {
        Self { cap }
    }

    /// 依次取请求值、作业覆盖值、全局默认值
    pub fn resolve_cap(
        requested: Option<u32>,
        assignment: &Assignment,
        review: &ReviewConfig,
    ) -> Result<u32> {
        if requested == Some(0) {
            return Err(PeerReviewError::validation(
                "max_outstanding must be at least 1",
            ));
        }

        let assignment_cap = assignment
            .max_outstanding_reviews
            .and_then(|cap| u32::try_from(cap).ok())
            .filter(|&cap| cap > 0);

        Ok(requested
            .or(assignment_cap)
            .unwrap_or(review.default_max_outstanding))
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn evaluate(&self, outstanding: u64) -> CapacityCheck {
        CapacityCheck {
            outstanding,
            cap: self.cap,
            allowed: outstanding < u64::from(self.cap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::assignment;

    #[test]
    fn test_evaluate_boundary() {
        let governor = OutstandingReviewGovernor::new(2);
        assert!(governor.evaluate(0).allowed);
        assert!(governor.evaluate(1).allowed);
        assert!(!governor.evaluate(2).allowed);
        assert_eq!(governor.evaluate(3).cap, 2);
    }

    #[test]
    fn test_cap_resolution_order() {
        let review = ReviewConfig::default();
        let mut config = assignment(1);

        assert_eq!(
            OutstandingReviewGovernor::resolve_cap(None, &config, &review).unwrap(),
            review.default_max_outstanding
        );

        config.max_outstanding_reviews = Some(5);
        assert_eq!(
            OutstandingReviewGovernor::resolve_cap(None, &config, &review).unwrap(),
            5
        );
        assert_eq!(
            OutstandingReviewGovernor::resolve_cap(Some(1), &config, &review).unwrap(),
            1
        );
        assert!(OutstandingReviewGovernor::resolve_cap(Some(0), &config, &review).is_err());
    }
}
