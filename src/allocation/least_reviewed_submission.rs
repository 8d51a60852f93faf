//! 最少评审优先（动态）
//!
//! 选择未提交评审数最少的团队；并列时优先最久没有获得评审者的团队
//! （从未被评审的最先），再按 id 升序。

use super::{AllocationSnapshot, DynamicStrategy, StrategyKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct LeastReviewedSubmission;

impl DynamicStrategy for LeastReviewedSubmission {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LeastReviewedSubmission
    }

    fn assign_one(&self, reviewer_id: i64, snapshot: &AllocationSnapshot) -> Option<i64> {
        snapshot
            .reviewees()
            .iter()
            .filter(|r| snapshot.is_eligible(reviewer_id, r.id))
            .min_by_key(|r| {
                let load = snapshot.reviewee_load(r.id);
                // None 排在 Some 之前，即从未被评审的团队优先
                (load.outstanding, load.last_assigned_at, r.id)
            })
            .map(|r| r.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::MappingFact;
    use crate::test_support::{assignment, individuals};

    fn fact(reviewer_id: i64, reviewee_id: i64, submitted: bool, created_at: i64) -> MappingFact {
        MappingFact {
            reviewer_id,
            reviewee_id,
            submitted,
            created_at,
        }
    }

    #[test]
    fn test_prefers_fewest_outstanding() {
        let mut parts = individuals(assignment(1), 4);
        parts.mappings = vec![fact(2, 101, false, 10), fact(3, 102, true, 20)];
        let snapshot = AllocationSnapshot::new(parts);

        // 101 有 1 份未提交；102、103 未提交为 0，103 从未被评审
        assert_eq!(LeastReviewedSubmission.assign_one(4, &snapshot), Some(103));
    }

    #[test]
    fn test_tie_broken_by_oldest_assignment_then_id() {
        let mut parts = individuals(assignment(1), 4);
        parts.mappings = vec![
            fact(1, 102, true, 50),
            fact(1, 103, true, 20),
            fact(2, 101, true, 30),
            fact(3, 104, true, 40),
        ];
        let snapshot = AllocationSnapshot::new(parts);

        // 评审者 4 不能评审 104（自评），103 最久未获得评审者
        assert_eq!(LeastReviewedSubmission.assign_one(4, &snapshot), Some(103));
        // 评审者 1 已评审 102、103，自身属于 101
        assert_eq!(LeastReviewedSubmission.assign_one(1, &snapshot), Some(104));
    }

    #[test]
    fn test_nothing_eligible() {
        let mut parts = individuals(assignment(1), 2);
        parts.mappings = vec![fact(1, 102, false, 1)];
        let snapshot = AllocationSnapshot::new(parts);
        assert_eq!(LeastReviewedSubmission.assign_one(1, &snapshot), None);
    }
}
