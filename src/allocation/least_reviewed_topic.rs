//! 选题均衡分配（动态）
//!
//! 按选题收到的评审总数升序排列，只考察最少的 k 个选题；在第一个存在可选团队的
//! 选题中，取评审数最少的团队（并列时优先最久未获得评审者，再按 id）。

use super::{AllocationSnapshot, DynamicStrategy, StrategyKind};

#[derive(Debug, Clone, Copy)]
pub struct LeastReviewedTopic {
    fairness_window: usize,
}

impl LeastReviewedTopic {
    pub fn new(fairness_window: usize) -> Self {
        Self {
            fairness_window: fairness_window.max(1),
        }
    }

    pub fn fairness_window(&self) -> usize {
        self.fairness_window
    }
}

/// 选题收到的评审总数
pub fn topic_load(snapshot: &AllocationSnapshot, team_ids: &[i64]) -> usize {
    team_ids
        .iter()
        .map(|&id| snapshot.reviewee_load(id).total)
        .sum()
}

impl DynamicStrategy for LeastReviewedTopic {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LeastReviewedTopic
    }

    fn assign_one(&self, reviewer_id: i64, snapshot: &AllocationSnapshot) -> Option<i64> {
        let mut ranked: Vec<(usize, i64, &[i64])> = snapshot
            .topics()
            .iter()
            .map(|t| {
                (
                    topic_load(snapshot, &t.team_ids),
                    t.topic_id,
                    t.team_ids.as_slice(),
                )
            })
            .collect();
        ranked.sort_by_key(|&(load, topic_id, _)| (load, topic_id));

        ranked
            .into_iter()
            .take(self.fairness_window)
            .find_map(|(_, _, team_ids)| {
                team_ids
                    .iter()
                    .copied()
                    .filter(|&team_id| snapshot.is_eligible(reviewer_id, team_id))
                    .min_by_key(|&team_id| {
                        let load = snapshot.reviewee_load(team_id);
                        (load.total, load.last_assigned_at, team_id)
                    })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{MappingFact, TopicPool};
    use crate::test_support::{assignment, individuals};
    use proptest::prelude::*;

    fn fact(reviewer_id: i64, reviewee_id: i64, created_at: i64) -> MappingFact {
        MappingFact {
            reviewer_id,
            reviewee_id,
            submitted: false,
            created_at,
        }
    }

    fn topic(topic_id: i64, team_ids: &[i64]) -> TopicPool {
        TopicPool {
            topic_id,
            team_ids: team_ids.to_vec(),
        }
    }

    #[test]
    fn test_picks_least_reviewed_topic_first() {
        let mut parts = individuals(assignment(1), 6);
        parts.topics = vec![topic(1, &[101, 102]), topic(2, &[103, 104]), topic(3, &[105])];
        parts.mappings = vec![fact(6, 101, 1), fact(6, 103, 2), fact(5, 104, 3)];
        let snapshot = AllocationSnapshot::new(parts);

        // 选题 3 没有评审，但评审者 5 属于 105
        assert_eq!(LeastReviewedTopic::new(3).assign_one(5, &snapshot), Some(102));
        assert_eq!(LeastReviewedTopic::new(3).assign_one(1, &snapshot), Some(105));
    }

    #[test]
    fn test_window_limits_candidate_topics() {
        let mut parts = individuals(assignment(1), 4);
        parts.topics = vec![topic(1, &[101]), topic(2, &[102, 103])];
        parts.mappings = vec![fact(3, 102, 1), fact(4, 103, 2)];
        let snapshot = AllocationSnapshot::new(parts);

        // 只看最少的 1 个选题（选题 1），评审者 1 属于 101
        assert_eq!(LeastReviewedTopic::new(1).assign_one(1, &snapshot), None);
        assert_eq!(LeastReviewedTopic::new(2).assign_one(1, &snapshot), Some(102));
    }

    #[test]
    fn test_zero_window_treated_as_one() {
        assert_eq!(LeastReviewedTopic::new(0).fairness_window(), 1);
    }

    #[test]
    fn test_sequential_picks_keep_topics_level() {
        // 3 个选题各 2 个团队，12 名不属于任何团队的评审者依次请求
        let mut parts = individuals(assignment(1), 6);
        parts.topics = vec![topic(1, &[101, 102]), topic(2, &[103, 104]), topic(3, &[105, 106])];
        parts
            .reviewers
            .extend((201..=212).map(|id| crate::allocation::NamedId::new(id, format!("r{id}"))));
        let strategy = LeastReviewedTopic::new(1);

        let spread = |snapshot: &AllocationSnapshot| {
            let loads: Vec<usize> = snapshot
                .topics()
                .iter()
                .map(|t| topic_load(snapshot, &t.team_ids))
                .collect();
            loads.iter().max().unwrap() - loads.iter().min().unwrap()
        };

        for (step, reviewer_id) in (201..=212).enumerate() {
            let snapshot = AllocationSnapshot::new(parts.clone());
            let before = spread(&snapshot);
            let chosen = strategy
                .assign_one(reviewer_id, &snapshot)
                .expect("every team is eligible for an outside reviewer");
            parts.mappings.push(fact(reviewer_id, chosen, step as i64 + 1));

            let after = spread(&AllocationSnapshot::new(parts.clone()));
            assert!(after <= 1, "spread {after} after step {step}");
            assert!(before == 0 || after <= before);
        }

        // 12 份评审平均落在 6 个团队上
        let snapshot = AllocationSnapshot::new(parts);
        for team_id in 101..=106 {
            assert_eq!(snapshot.reviewee_load(team_id).total, 2);
        }
    }

    proptest! {
        #[test]
        fn prop_chosen_topic_is_within_window(
            loads in proptest::collection::vec(0usize..4, 2..6),
            window in 1usize..4,
        ) {
            // 每个选题一个团队，团队 100+i 已有 loads[i] 份来自外部评审者的评审
            let n = loads.len();
            let mut parts = individuals(assignment(1), n);
            parts.reviewers.push(crate::allocation::NamedId::new(999, "outsider"));
            let mut created_at = 0;
            for (i, &load) in loads.iter().enumerate() {
                for extra in 0..load {
                    created_at += 1;
                    parts.mappings.push(fact(1000 + extra as i64, 101 + i as i64, created_at));
                }
            }
            parts.topics = (0..n).map(|i| topic(i as i64 + 1, &[101 + i as i64])).collect();
            let snapshot = AllocationSnapshot::new(parts);

            let chosen = LeastReviewedTopic::new(window).assign_one(999, &snapshot);
            let chosen = chosen.expect("outsider is eligible everywhere");
            let chosen_load = snapshot.reviewee_load(chosen).total;
            let mut sorted = loads.clone();
            sorted.sort_unstable();
            prop_assert_eq!(chosen_load, sorted[0]);
        }
    }
}
