//! 批量分配

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use super::{BatchReport, ReviewMappingHandler, Shortfall};
use crate::allocation::{
    AllocationSnapshot, BatchStrategy, CsvImport, ProposalError, RandomStatic, RoundRobin,
};
use crate::errors::{PeerReviewError, Result};

impl ReviewMappingHandler {
    /// 逐条持久化批量策略的提议
    ///
    /// 单条失败记入报告后继续；只有存储不可用时中止，已提交的映射保留。
    pub async fn assign_statically(
        &self,
        snapshot: &AllocationSnapshot,
        strategy: &dyn BatchStrategy,
    ) -> Result<BatchReport> {
        let assignment_id = snapshot.assignment().id;
        let kind = strategy.kind();
        let mut report = BatchReport::new(kind, strategy.target_per_reviewee());
        let mut created_for: HashMap<i64, usize> = HashMap::new();

        for proposal in strategy.propose_pairs(snapshot) {
            let pair = match proposal {
                Ok(pair) => pair,
                Err(e) => {
                    debug!("[{}] proposal rejected: {}", kind, e.message);
                    report.errors.push(e);
                    continue;
                }
            };

            match self
                .storage
                .insert_review_mapping(assignment_id, pair.reviewer_id, pair.reviewee_id)
                .await
            {
                Ok(mapping) => {
                    debug!(
                        "[{}] reviewer {} -> reviewee {} (mapping {})",
                        kind, pair.reviewer_id, pair.reviewee_id, mapping.id
                    );
                    report.created.push(mapping.id);
                    *created_for.entry(pair.reviewee_id).or_default() += 1;
                }
                Err(PeerReviewError::Conflict(msg)) => {
                    warn!("[{}] duplicate pair skipped: {}", kind, msg);
                    report.errors.push(ProposalError::for_pair(
                        pair,
                        "Review mapping already exists",
                    ));
                }
                Err(e) if e.is_fatal() => {
                    error!(
                        "[{}] aborted after {} mappings: {}",
                        kind,
                        report.created.len(),
                        e
                    );
                    return Err(e);
                }
                Err(e) => {
                    report
                        .errors
                        .push(ProposalError::for_pair(pair, e.message()));
                }
            }
        }

        if let Some(target) = report.target_per_reviewee {
            report.shortfall = snapshot
                .reviewees()
                .iter()
                .filter_map(|r| {
                    let have = snapshot.reviewee_load(r.id).total
                        + created_for.get(&r.id).copied().unwrap_or(0);
                    (have < target).then(|| Shortfall {
                        reviewee_id: r.id,
                        missing: target - have,
                    })
                })
                .collect();
        }

        info!(
            "[{}] assignment {}: {} created, {} errors, {} reviewees short",
            kind,
            assignment_id,
            report.created.len(),
            report.errors.len(),
            report.shortfall.len()
        );

        Ok(report)
    }

    pub async fn assign_round_robin(
        &self,
        assignment_id: i64,
        reviews_per_submission: Option<u32>,
    ) -> Result<BatchReport> {
        let snapshot = self.load_snapshot(assignment_id).await?;
        let k = target_or_default(reviews_per_submission, &snapshot)?;
        self.assign_statically(&snapshot, &RoundRobin::new(k)).await
    }

    pub async fn assign_randomly(
        &self,
        assignment_id: i64,
        reviews_per_submission: Option<u32>,
        seed: Option<u64>,
    ) -> Result<BatchReport> {
        let snapshot = self.load_snapshot(assignment_id).await?;
        let k = target_or_default(reviews_per_submission, &snapshot)?;
        self.assign_statically(&snapshot, &RandomStatic::new(k, seed))
            .await
    }

    pub async fn assign_from_csv(&self, assignment_id: i64, text: &str) -> Result<BatchReport> {
        let snapshot = self.load_snapshot(assignment_id).await?;
        let import = CsvImport::parse(text, self.review.max_csv_rows)?;
        debug!("Parsed {} CSV rows", import.rows().len());
        self.assign_statically(&snapshot, &import).await
    }
}

/// 请求值优先，否则使用作业的每份提交评审数
fn target_or_default(requested: Option<u32>, snapshot: &AllocationSnapshot) -> Result<usize> {
    match requested {
        Some(0) => Err(PeerReviewError::validation(
            "reviews_per_submission must be at least 1",
        )),
        Some(k) => Ok(k as usize),
        None => Ok(snapshot.assignment().reviews_per_submission.max(1) as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReviewConfig;
    use crate::models::review_mappings::requests::ReviewMappingListQuery;
    use crate::test_support::{assignment_request, memory_storage, seed_individuals};

    #[tokio::test]
    async fn test_round_robin_meets_target_once() {
        let storage = memory_storage().await;
        let roster = seed_individuals(&storage, assignment_request("rr"), 5).await;
        let handler = ReviewMappingHandler::new(storage.clone(), ReviewConfig::default());

        let report = handler
            .assign_round_robin(roster.assignment.id, None)
            .await
            .unwrap();
        assert_eq!(report.created.len(), 10);
        assert!(report.errors.is_empty());
        assert!(report.shortfall.is_empty());

        // 已有映射计入目标，重复执行不再创建
        let again = handler
            .assign_round_robin(roster.assignment.id, None)
            .await
            .unwrap();
        assert!(again.created.is_empty());

        let all = storage
            .list_review_mappings(roster.assignment.id, ReviewMappingListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 10);
        for mapping in &all {
            let reviewer_index = roster
                .participants
                .iter()
                .position(|p| p.id == mapping.reviewer_id)
                .unwrap();
            assert_ne!(roster.teams[reviewer_index].id, mapping.reviewee_id);
        }
    }

    #[tokio::test]
    async fn test_round_robin_reports_shortfall() {
        let storage = memory_storage().await;
        let roster = seed_individuals(&storage, assignment_request("short"), 2).await;
        let handler = ReviewMappingHandler::new(storage, ReviewConfig::default());

        let report = handler
            .assign_round_robin(roster.assignment.id, Some(3))
            .await
            .unwrap();
        assert_eq!(report.created.len(), 2);
        assert_eq!(report.shortfall.len(), 2);
        assert!(report.shortfall.iter().all(|s| s.missing == 2));
    }

    #[tokio::test]
    async fn test_zero_target_is_rejected() {
        let storage = memory_storage().await;
        let roster = seed_individuals(&storage, assignment_request("zero"), 2).await;
        let handler = ReviewMappingHandler::new(storage, ReviewConfig::default());

        let err = handler
            .assign_randomly(roster.assignment.id, Some(0), Some(1))
            .await
            .unwrap_err();
        assert!(matches!(err, PeerReviewError::Validation(_)));
    }

    #[tokio::test]
    async fn test_csv_partial_success() {
        let storage = memory_storage().await;
        let roster = seed_individuals(&storage, assignment_request("csv"), 3).await;
        let handler = ReviewMappingHandler::new(storage, ReviewConfig::default());

        let report = handler
            .assign_from_csv(
                roster.assignment.id,
                "reviewee,reviewer\nt1,p2,p3\nt2,p3\nt3,nobody\n",
            )
            .await
            .unwrap();
        assert_eq!(report.created.len(), 3);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].row, Some(4));
        assert!(report.target_per_reviewee.is_none());
        assert!(report.shortfall.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_assignment() {
        let storage = memory_storage().await;
        let handler = ReviewMappingHandler::new(storage, ReviewConfig::default());
        let err = handler.assign_round_robin(42, None).await.unwrap_err();
        assert!(matches!(err, PeerReviewError::NotFound(_)));
    }
}
