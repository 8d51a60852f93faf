//! 轮转分配
//!
//! 按轮次推进：第 r 轮中评审数不足 r+1 的团队各获得一名评审者，
//! 因此所有团队先达到 r 再有团队达到 r+1。评审者取当前负载最低者，
//! 同负载时从游标位置起按 id 顺序选取，游标越过上一次选中的评审者。

use std::collections::HashSet;

use tracing::debug;

use super::{AllocationSnapshot, BatchStrategy, Proposal, ReviewPair, StrategyKind};

#[derive(Debug, Clone)]
pub struct RoundRobin {
    reviews_per_submission: usize,
}

impl RoundRobin {
    pub fn new(reviews_per_submission: usize) -> Self {
        Self {
            reviews_per_submission,
        }
    }
}

impl BatchStrategy for RoundRobin {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RoundRobin
    }

    fn target_per_reviewee(&self) -> Option<usize> {
        Some(self.reviews_per_submission)
    }

    fn propose_pairs<'a>(
        &'a self,
        snapshot: &'a AllocationSnapshot,
    ) -> Box<dyn Iterator<Item = Proposal> + Send + 'a> {
        Box::new(RoundRobinPairs::new(snapshot, self.reviews_per_submission))
    }
}

pub struct RoundRobinPairs<'a> {
    snapshot: &'a AllocationSnapshot,
    reviewer_ids: Vec<i64>,
    reviewee_ids: Vec<i64>,
    target: usize,
    // 已有映射计入目标与负载
    received: Vec<usize>,
    loads: Vec<usize>,
    proposed: HashSet<(i64, i64)>,
    round: usize,
    position: usize,
    cursor: usize,
}

impl<'a> RoundRobinPairs<'a> {
    fn new(snapshot: &'a AllocationSnapshot, target: usize) -> Self {
        let reviewer_ids: Vec<i64> = snapshot.reviewers().iter().map(|r| r.id).collect();
        let reviewee_ids: Vec<i64> = snapshot.reviewees().iter().map(|r| r.id).collect();
        let received = reviewee_ids
            .iter()
            .map(|&id| snapshot.reviewee_load(id).total)
            .collect();
        let loads = reviewer_ids
            .iter()
            .map(|&id| snapshot.reviewer_total(id))
            .collect();

        Self {
            snapshot,
            reviewer_ids,
            reviewee_ids,
            target,
            received,
            loads,
            proposed: HashSet::new(),
            round: 0,
            position: 0,
            cursor: 0,
        }
    }

    /// 选出负载最低、离游标最近的可用评审者下标
    fn pick_reviewer(&self, reviewee_id: i64) -> Option<usize> {
        let n = self.reviewer_ids.len();
        (0..n)
            .filter(|&i| {
                let reviewer_id = self.reviewer_ids[i];
                self.snapshot.is_eligible(reviewer_id, reviewee_id)
                    && !self.proposed.contains(&(reviewer_id, reviewee_id))
            })
            .min_by_key(|&i| (self.loads[i], (i + n - self.cursor) % n))
    }
}

impl Iterator for RoundRobinPairs<'_> {
    type Item = Proposal;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reviewer_ids.is_empty() {
            return None;
        }

        while self.round < self.target {
            if self.position >= self.reviewee_ids.len() {
                self.round += 1;
                self.position = 0;
                continue;
            }

            let index = self.position;
            self.position += 1;

            if self.received[index] > self.round {
                continue;
            }

            let reviewee_id = self.reviewee_ids[index];
            let Some(pick) = self.pick_reviewer(reviewee_id) else {
                debug!(
                    "Round {}: no eligible reviewer left for reviewee {}",
                    self.round, reviewee_id
                );
                continue;
            };

            let reviewer_id = self.reviewer_ids[pick];
            self.loads[pick] += 1;
            self.received[index] += 1;
            self.proposed.insert((reviewer_id, reviewee_id));
            self.cursor = (pick + 1) % self.reviewer_ids.len();

            return Some(Ok(ReviewPair::new(reviewer_id, reviewee_id)));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::snapshot::{MappingFact, NamedId, SnapshotParts};
    use crate::test_support::{assignment, individuals};
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn run(snapshot: &AllocationSnapshot, k: usize) -> Vec<ReviewPair> {
        RoundRobin::new(k)
            .propose_pairs(snapshot)
            .map(|p| p.expect("round robin never yields errors"))
            .collect()
    }

    #[test]
    fn test_shift_pattern_for_individuals() {
        let snapshot = AllocationSnapshot::new(individuals(assignment(1), 4));
        let pairs = run(&snapshot, 2);

        assert_eq!(
            pairs,
            vec![
                ReviewPair::new(2, 101),
                ReviewPair::new(3, 102),
                ReviewPair::new(4, 103),
                ReviewPair::new(1, 104),
                ReviewPair::new(3, 101),
                ReviewPair::new(4, 102),
                ReviewPair::new(1, 103),
                ReviewPair::new(2, 104),
            ]
        );
    }

    #[test]
    fn test_teams_of_two_balance_reviewers() {
        // 6 名参与者分成 3 个两人团队，每个团队需要 2 份评审
        let parts = SnapshotParts {
            assignment: assignment(1),
            reviewers: (1..=6).map(|i| NamedId::new(i, format!("p{i}"))).collect(),
            reviewees: (1..=3)
                .map(|t| NamedId::new(100 + t, format!("t{t}")))
                .collect(),
            team_members: vec![(101, 1), (101, 2), (102, 3), (102, 4), (103, 5), (103, 6)],
            topics: vec![],
            mappings: vec![],
        };
        let snapshot = AllocationSnapshot::new(parts);
        let pairs = run(&snapshot, 2);

        assert_eq!(pairs.len(), 6);
        let mut per_reviewer: HashMap<i64, usize> = HashMap::new();
        for pair in &pairs {
            assert!(!snapshot.is_self_review(pair.reviewer_id, pair.reviewee_id));
            *per_reviewer.entry(pair.reviewer_id).or_default() += 1;
        }
        assert_eq!(per_reviewer.len(), 6);
        assert!(per_reviewer.values().all(|&c| c == 1));
    }

    #[test]
    fn test_existing_mappings_count_toward_target() {
        let mut parts = individuals(assignment(1), 4);
        parts.mappings = vec![MappingFact {
            reviewer_id: 2,
            reviewee_id: 101,
            submitted: false,
            created_at: 1,
        }];
        let snapshot = AllocationSnapshot::new(parts);
        let pairs = run(&snapshot, 1);

        assert_eq!(pairs.len(), 3);
        assert!(pairs.iter().all(|p| p.reviewee_id != 101));
        // 评审者 2 已有负载，不会再被优先选中
        assert!(pairs.iter().all(|p| p.reviewer_id != 2));
    }

    #[test]
    fn test_unreachable_target_leaves_shortfall() {
        // 只有 2 名参与者时，每个团队最多获得 1 份非自评评审
        let snapshot = AllocationSnapshot::new(individuals(assignment(1), 2));
        let pairs = run(&snapshot, 3);
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_no_reviewers_yields_nothing() {
        let mut parts = individuals(assignment(1), 3);
        parts.reviewers.clear();
        let snapshot = AllocationSnapshot::new(parts);
        assert!(run(&snapshot, 2).is_empty());
    }

    proptest! {
        #[test]
        fn prop_individuals_get_exactly_k_and_even_load(n in 2usize..24, k_seed in 1usize..24) {
            let k = 1 + k_seed % (n - 1);
            let snapshot = AllocationSnapshot::new(individuals(assignment(1), n));
            let pairs = run(&snapshot, k);

            let mut seen = HashSet::new();
            let mut per_reviewee: HashMap<i64, usize> = HashMap::new();
            let mut per_reviewer: HashMap<i64, usize> = HashMap::new();
            for pair in &pairs {
                prop_assert!(seen.insert((pair.reviewer_id, pair.reviewee_id)));
                prop_assert!(!snapshot.is_self_review(pair.reviewer_id, pair.reviewee_id));
                *per_reviewee.entry(pair.reviewee_id).or_default() += 1;
                *per_reviewer.entry(pair.reviewer_id).or_default() += 1;
            }

            prop_assert_eq!(per_reviewee.len(), n);
            prop_assert!(per_reviewee.values().all(|&c| c == k));
            let max = per_reviewer.values().copied().max().unwrap_or(0);
            let min = (1..=n as i64)
                .map(|id| per_reviewer.get(&id).copied().unwrap_or(0))
                .min()
                .unwrap_or(0);
            prop_assert!(max - min <= 1);
        }
    }
}
