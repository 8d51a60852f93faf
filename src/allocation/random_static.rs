//! 随机分配
//!
//! 每一遍打乱评审者顺序，每名评审者在剩余需求最大的可选团队中均匀随机抽取一个，
//! 直到某一遍没有任何进展。

use std::collections::{HashMap, HashSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};

use super::{AllocationSnapshot, BatchStrategy, Proposal, ReviewPair, StrategyKind};

#[derive(Debug, Clone)]
pub struct RandomStatic {
    reviews_per_submission: usize,
    seed: Option<u64>,
}

impl RandomStatic {
    pub fn new(reviews_per_submission: usize, seed: Option<u64>) -> Self {
        Self {
            reviews_per_submission,
            seed,
        }
    }

    fn generate(&self, snapshot: &AllocationSnapshot) -> Vec<ReviewPair> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut need: HashMap<i64, usize> = snapshot
            .reviewees()
            .iter()
            .map(|r| {
                let have = snapshot.reviewee_load(r.id).total;
                (r.id, self.reviews_per_submission.saturating_sub(have))
            })
            .filter(|&(_, remaining)| remaining > 0)
            .collect();

        let mut reviewer_ids: Vec<i64> = snapshot.reviewers().iter().map(|r| r.id).collect();
        let mut proposed: HashSet<(i64, i64)> = HashSet::new();
        let mut pairs = Vec::new();

        loop {
            reviewer_ids.shuffle(&mut rng);
            let mut progressed = false;

            for &reviewer_id in &reviewer_ids {
                // 候选按 id 排序后再抽取，保证同一种子结果一致
                let mut candidates: Vec<(i64, usize)> = need
                    .iter()
                    .filter(|&(&reviewee_id, &remaining)| {
                        remaining > 0
                            && snapshot.is_eligible(reviewer_id, reviewee_id)
                            && !proposed.contains(&(reviewer_id, reviewee_id))
                    })
                    .map(|(&id, &remaining)| (id, remaining))
                    .collect();
                let Some(max_need) = candidates.iter().map(|&(_, r)| r).max() else {
                    continue;
                };
                candidates.retain(|&(_, r)| r == max_need);
                candidates.sort_unstable();

                let Some(&(reviewee_id, _)) = candidates.choose(&mut rng) else {
                    continue;
                };

                if let Some(remaining) = need.get_mut(&reviewee_id) {
                    *remaining -= 1;
                }
                proposed.insert((reviewer_id, reviewee_id));
                pairs.push(ReviewPair::new(reviewer_id, reviewee_id));
                progressed = true;
            }

            if !progressed {
                break;
            }
        }

        pairs
    }
}

impl BatchStrategy for RandomStatic {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RandomStatic
    }

    fn target_per_reviewee(&self) -> Option<usize> {
        Some(self.reviews_per_submission)
    }

    fn propose_pairs<'a>(
        &'a self,
        snapshot: &'a AllocationSnapshot,
    ) -> Box<dyn Iterator<Item = Proposal> + Send + 'a> {
        Box::new(self.generate(snapshot).into_iter().map(Ok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{assignment, individuals};
    use proptest::prelude::*;

    fn run(snapshot: &AllocationSnapshot, k: usize, seed: Option<u64>) -> Vec<ReviewPair> {
        RandomStatic::new(k, seed)
            .propose_pairs(snapshot)
            .filter_map(Result::ok)
            .collect()
    }

    #[test]
    fn test_same_seed_same_result() {
        let snapshot = AllocationSnapshot::new(individuals(assignment(1), 8));
        assert_eq!(run(&snapshot, 3, Some(42)), run(&snapshot, 3, Some(42)));
    }

    #[test]
    fn test_unseeded_still_meets_target() {
        let snapshot = AllocationSnapshot::new(individuals(assignment(1), 5));
        let pairs = run(&snapshot, 2, None);
        assert_eq!(pairs.len(), 10);
    }

    #[test]
    fn test_respects_existing_load() {
        let mut parts = individuals(assignment(1), 3);
        parts.mappings = vec![crate::allocation::MappingFact {
            reviewer_id: 2,
            reviewee_id: 101,
            submitted: true,
            created_at: 5,
        }];
        let snapshot = AllocationSnapshot::new(parts);
        let pairs = run(&snapshot, 1, Some(7));

        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.reviewee_id != 101));
    }

    proptest! {
        #[test]
        fn prop_unique_pairs_without_self_review(n in 2usize..16, k_seed in 1usize..16, seed in any::<u64>()) {
            let k = 1 + k_seed % (n - 1);
            let snapshot = AllocationSnapshot::new(individuals(assignment(1), n));
            let pairs = run(&snapshot, k, Some(seed));

            let mut seen = HashSet::new();
            let mut per_reviewee: HashMap<i64, usize> = HashMap::new();
            for pair in &pairs {
                prop_assert!(seen.insert((pair.reviewer_id, pair.reviewee_id)));
                prop_assert!(!snapshot.is_self_review(pair.reviewer_id, pair.reviewee_id));
                *per_reviewee.entry(pair.reviewee_id).or_default() += 1;
            }
            prop_assert!(per_reviewee.values().all(|&c| c <= k));
        }
    }
}
