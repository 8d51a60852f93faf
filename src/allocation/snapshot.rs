//! 分配快照
//!
//! 每次请求从存储层重新加载，策略只读取快照，不缓存任何派生计数。

use std::collections::{HashMap, HashSet};

use crate::models::assignments::entities::Assignment;

/// 带名称的实体引用（评审者或被评审团队）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedId {
    pub id: i64,
    pub name: String,
}

impl NamedId {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// 一个选题及其报名团队
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPool {
    pub topic_id: i64,
    pub team_ids: Vec<i64>,
}

/// 已存在的普通评审映射
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingFact {
    pub reviewer_id: i64,
    pub reviewee_id: i64,
    pub submitted: bool,
    /// 毫秒时间戳
    pub created_at: i64,
}

/// 存储层装配快照所需的原始数据
#[derive(Debug, Clone)]
pub struct SnapshotParts {
    pub assignment: Assignment,
    pub reviewers: Vec<NamedId>,
    pub reviewees: Vec<NamedId>,
    /// (team_id, participant_id)
    pub team_members: Vec<(i64, i64)>,
    pub topics: Vec<TopicPool>,
    /// 只包含非校准映射
    pub mappings: Vec<MappingFact>,
}

/// 被评审团队的负载
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevieweeLoad {
    pub total: usize,
    pub outstanding: usize,
    pub last_assigned_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct AllocationSnapshot {
    assignment: Assignment,
    reviewers: Vec<NamedId>,
    reviewees: Vec<NamedId>,
    members: HashMap<i64, HashSet<i64>>,
    topics: Vec<TopicPool>,
    pairs: HashSet<(i64, i64)>,
    reviewee_loads: HashMap<i64, RevieweeLoad>,
    reviewer_totals: HashMap<i64, usize>,
    reviewer_outstanding: HashMap<i64, usize>,
    reviewer_by_name: HashMap<String, i64>,
    reviewee_by_name: HashMap<String, i64>,
}

impl AllocationSnapshot {
    pub fn new(parts: SnapshotParts) -> Self {
        let SnapshotParts {
            assignment,
            mut reviewers,
            mut reviewees,
            team_members,
            mut topics,
            mappings,
        } = parts;

        // 按 id 排序，保证策略结果可复现
        reviewers.sort_by_key(|r| r.id);
        reviewers.dedup_by_key(|r| r.id);
        reviewees.sort_by_key(|r| r.id);
        reviewees.dedup_by_key(|r| r.id);
        topics.sort_by_key(|t| t.topic_id);
        for topic in &mut topics {
            topic.team_ids.sort_unstable();
            topic.team_ids.dedup();
        }

        let mut members: HashMap<i64, HashSet<i64>> = HashMap::new();
        for (team_id, participant_id) in team_members {
            members.entry(team_id).or_default().insert(participant_id);
        }

        let mut pairs = HashSet::with_capacity(mappings.len());
        let mut reviewee_loads: HashMap<i64, RevieweeLoad> = HashMap::new();
        let mut reviewer_totals: HashMap<i64, usize> = HashMap::new();
        let mut reviewer_outstanding: HashMap<i64, usize> = HashMap::new();

        for fact in mappings {
            pairs.insert((fact.reviewer_id, fact.reviewee_id));

            let load = reviewee_loads.entry(fact.reviewee_id).or_default();
            load.total += 1;
            if !fact.submitted {
                load.outstanding += 1;
            }
            load.last_assigned_at = Some(
                load.last_assigned_at
                    .map_or(fact.created_at, |at| at.max(fact.created_at)),
            );

            *reviewer_totals.entry(fact.reviewer_id).or_default() += 1;
            if !fact.submitted {
                *reviewer_outstanding.entry(fact.reviewer_id).or_default() += 1;
            }
        }

        let reviewer_by_name = reviewers
            .iter()
            .map(|r| (r.name.trim().to_string(), r.id))
            .collect();
        let reviewee_by_name = reviewees
            .iter()
            .map(|r| (r.name.trim().to_string(), r.id))
            .collect();

        Self {
            assignment,
            reviewers,
            reviewees,
            members,
            topics,
            pairs,
            reviewee_loads,
            reviewer_totals,
            reviewer_outstanding,
            reviewer_by_name,
            reviewee_by_name,
        }
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn reviewers(&self) -> &[NamedId] {
        &self.reviewers
    }

    pub fn reviewees(&self) -> &[NamedId] {
        &self.reviewees
    }

    pub fn topics(&self) -> &[TopicPool] {
        &self.topics
    }

    pub fn contains_reviewer(&self, reviewer_id: i64) -> bool {
        self.reviewers
            .binary_search_by_key(&reviewer_id, |r| r.id)
            .is_ok()
    }

    pub fn contains_reviewee(&self, reviewee_id: i64) -> bool {
        self.reviewees
            .binary_search_by_key(&reviewee_id, |r| r.id)
            .is_ok()
    }

    /// 评审者是否就是被评审团队（或其成员）
    ///
    /// 作业允许自评时始终返回 false。
    pub fn is_self_review(&self, reviewer_id: i64, reviewee_id: i64) -> bool {
        if self.assignment.allow_self_review {
            return false;
        }
        if self.assignment.team_reviewing {
            reviewer_id == reviewee_id
        } else {
            self.members
                .get(&reviewee_id)
                .is_some_and(|m| m.contains(&reviewer_id))
        }
    }

    pub fn has_pair(&self, reviewer_id: i64, reviewee_id: i64) -> bool {
        self.pairs.contains(&(reviewer_id, reviewee_id))
    }

    /// 被评审团队对该评审者是否可分配
    pub fn is_eligible(&self, reviewer_id: i64, reviewee_id: i64) -> bool {
        self.contains_reviewee(reviewee_id)
            && !self.has_pair(reviewer_id, reviewee_id)
            && !self.is_self_review(reviewer_id, reviewee_id)
    }

    pub fn reviewee_load(&self, reviewee_id: i64) -> RevieweeLoad {
        self.reviewee_loads
            .get(&reviewee_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn reviewer_total(&self, reviewer_id: i64) -> usize {
        self.reviewer_totals.get(&reviewer_id).copied().unwrap_or(0)
    }

    pub fn outstanding_for(&self, reviewer_id: i64) -> usize {
        self.reviewer_outstanding
            .get(&reviewer_id)
            .copied()
            .unwrap_or(0)
    }

    /// 按名称解析评审者（参与者标识，团队评审时为团队名）
    pub fn resolve_reviewer(&self, name: &str) -> Option<i64> {
        self.reviewer_by_name.get(name.trim()).copied()
    }

    /// 按团队名解析被评审团队
    pub fn resolve_reviewee(&self, name: &str) -> Option<i64> {
        self.reviewee_by_name.get(name.trim()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{assignment, individuals};

    #[test]
    fn test_self_review_uses_team_membership() {
        let mut parts = individuals(assignment(1), 3);
        parts.team_members.push((101, 2));
        let snapshot = AllocationSnapshot::new(parts);

        assert!(snapshot.is_self_review(1, 101));
        assert!(snapshot.is_self_review(2, 101));
        assert!(!snapshot.is_self_review(3, 101));
        assert!(!snapshot.is_eligible(1, 101));
        assert!(snapshot.is_eligible(3, 101));
    }

    #[test]
    fn test_allow_self_review_disables_check() {
        let mut config = assignment(1);
        config.allow_self_review = true;
        let snapshot = AllocationSnapshot::new(individuals(config, 2));
        assert!(!snapshot.is_self_review(1, 101));
        assert!(snapshot.is_eligible(1, 101));
    }

    #[test]
    fn test_team_reviewing_compares_team_ids() {
        let mut config = assignment(1);
        config.team_reviewing = true;
        let parts = SnapshotParts {
            assignment: config,
            reviewers: vec![NamedId::new(10, "red"), NamedId::new(11, "blue")],
            reviewees: vec![NamedId::new(10, "red"), NamedId::new(11, "blue")],
            team_members: vec![(10, 1), (11, 2)],
            topics: vec![],
            mappings: vec![],
        };
        let snapshot = AllocationSnapshot::new(parts);
        assert!(snapshot.is_self_review(10, 10));
        assert!(!snapshot.is_self_review(10, 11));
        assert_eq!(snapshot.resolve_reviewer(" blue "), Some(11));
    }

    #[test]
    fn test_loads_and_pairs_from_existing_mappings() {
        let mut parts = individuals(assignment(1), 3);
        parts.mappings = vec![
            MappingFact {
                reviewer_id: 1,
                reviewee_id: 102,
                submitted: false,
                created_at: 10,
            },
            MappingFact {
                reviewer_id: 3,
                reviewee_id: 102,
                submitted: true,
                created_at: 30,
            },
        ];
        let snapshot = AllocationSnapshot::new(parts);

        assert!(snapshot.has_pair(1, 102));
        assert!(!snapshot.is_eligible(1, 102));
        assert_eq!(
            snapshot.reviewee_load(102),
            RevieweeLoad {
                total: 2,
                outstanding: 1,
                last_assigned_at: Some(30),
            }
        );
        assert_eq!(snapshot.reviewee_load(103), RevieweeLoad::default());
        assert_eq!(snapshot.outstanding_for(1), 1);
        assert_eq!(snapshot.outstanding_for(3), 0);
        assert_eq!(snapshot.reviewer_total(3), 1);
    }

    #[test]
    fn test_resolve_names() {
        let snapshot = AllocationSnapshot::new(individuals(assignment(1), 2));
        assert_eq!(snapshot.resolve_reviewer("p1"), Some(1));
        assert_eq!(snapshot.resolve_reviewee("t2"), Some(102));
        assert_eq!(snapshot.resolve_reviewee("p1"), None);
        assert!(snapshot.contains_reviewer(2));
        assert!(!snapshot.contains_reviewer(102));
    }
}
