//! CSV 导入分配
//!
//! 每行格式为 `reviewee, reviewer[, reviewer...]`，首行第一列为 `reviewee` 或
//! `contributor` 时视为表头跳过。无法解析的行只产生单条错误，其余行照常导入。

use std::collections::{HashSet, VecDeque};

use csv::{ReaderBuilder, Trim};

use super::{
    AllocationSnapshot, BatchStrategy, Proposal, ProposalError, ReviewPair, StrategyKind,
};
use crate::errors::{PeerReviewError, Result};

const HEADER_CELLS: [&str; 2] = ["reviewee", "contributor"];

/// 解析后的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    /// 文件中的行号（从 1 开始）
    pub line: usize,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CsvImport {
    rows: Vec<CsvRow>,
}

impl CsvImport {
    /// 解析 CSV 文本，文件级错误（编码、行数超限、空文件）直接返回
    pub fn parse(text: &str, max_rows: usize) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        let mut header_checked = false;
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(index + 1);
            let cells: Vec<String> = record.iter().map(str::to_string).collect();

            // 跳过空行
            if cells.iter().all(|c| c.is_empty()) {
                continue;
            }

            // 只检查第一条非空行是否为表头
            if !header_checked {
                header_checked = true;
                if cells
                    .first()
                    .is_some_and(|c| HEADER_CELLS.contains(&c.to_ascii_lowercase().as_str()))
                {
                    continue;
                }
            }

            rows.push(CsvRow { line, cells });
            if rows.len() > max_rows {
                return Err(PeerReviewError::validation(format!(
                    "CSV file exceeds the limit of {max_rows} rows"
                )));
            }
        }

        if rows.is_empty() {
            return Err(PeerReviewError::validation(
                "CSV file contains no review rows",
            ));
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[CsvRow] {
        &self.rows
    }
}

impl BatchStrategy for CsvImport {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CsvImport
    }

    fn propose_pairs<'a>(
        &'a self,
        snapshot: &'a AllocationSnapshot,
    ) -> Box<dyn Iterator<Item = Proposal> + Send + 'a> {
        Box::new(CsvPairs {
            snapshot,
            rows: self.rows.iter(),
            pending: VecDeque::new(),
            seen: HashSet::new(),
        })
    }
}

struct CsvPairs<'a> {
    snapshot: &'a AllocationSnapshot,
    rows: std::slice::Iter<'a, CsvRow>,
    pending: VecDeque<Proposal>,
    seen: HashSet<(i64, i64)>,
}

impl CsvPairs<'_> {
    fn expand(&mut self, row: &CsvRow) {
        let reviewee_name = row.cells.first().map(String::as_str).unwrap_or_default();
        let reviewer_names: Vec<&str> = row
            .cells
            .iter()
            .skip(1)
            .map(String::as_str)
            .filter(|c| !c.is_empty())
            .collect();

        if reviewee_name.is_empty() || reviewer_names.is_empty() {
            self.pending.push_back(Err(ProposalError::at_row(
                row.line,
                "Malformed row: expected `reviewee, reviewer[, reviewer...]`",
            )));
            return;
        }

        let Some(reviewee_id) = self.snapshot.resolve_reviewee(reviewee_name) else {
            self.pending.push_back(Err(ProposalError::at_row(
                row.line,
                format!("Unknown reviewee team: {reviewee_name}"),
            )
            .with_reviewee(reviewee_name)));
            return;
        };

        for reviewer_name in reviewer_names {
            let proposal = self.resolve_pair(row.line, reviewee_name, reviewee_id, reviewer_name);
            self.pending.push_back(proposal);
        }
    }

    fn resolve_pair(
        &mut self,
        line: usize,
        reviewee_name: &str,
        reviewee_id: i64,
        reviewer_name: &str,
    ) -> Proposal {
        let error = |message: String| {
            ProposalError::at_row(line, message)
                .with_reviewer(reviewer_name)
                .with_reviewee(reviewee_name)
        };

        let Some(reviewer_id) = self.snapshot.resolve_reviewer(reviewer_name) else {
            return Err(error(format!("Unknown reviewer: {reviewer_name}")));
        };
        if self.snapshot.is_self_review(reviewer_id, reviewee_id) {
            return Err(error(format!(
                "{reviewer_name} cannot review their own submission"
            )));
        }
        if self.snapshot.has_pair(reviewer_id, reviewee_id) {
            return Err(error(format!(
                "{reviewer_name} is already assigned to review {reviewee_name}"
            )));
        }
        if !self.seen.insert((reviewer_id, reviewee_id)) {
            return Err(error(format!(
                "Duplicate pair in file: {reviewer_name} -> {reviewee_name}"
            )));
        }

        Ok(ReviewPair::new(reviewer_id, reviewee_id))
    }
}

impl Iterator for CsvPairs<'_> {
    type Item = Proposal;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(proposal) = self.pending.pop_front() {
                return Some(proposal);
            }
            let row = self.rows.next()?;
            self.expand(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::MappingFact;
    use crate::test_support::{assignment, individuals};

    fn proposals(text: &str) -> Vec<Proposal> {
        let mut parts = individuals(assignment(1), 4);
        parts.mappings = vec![MappingFact {
            reviewer_id: 4,
            reviewee_id: 103,
            submitted: false,
            created_at: 1,
        }];
        let snapshot = AllocationSnapshot::new(parts);
        let import = CsvImport::parse(text, 100).expect("csv should parse");
        import.propose_pairs(&snapshot).collect()
    }

    #[test]
    fn test_header_row_is_skipped() {
        let import = CsvImport::parse("Contributor,Reviewer\nt1,p2\n", 10).unwrap();
        assert_eq!(import.rows().len(), 1);
        assert_eq!(import.rows()[0].line, 2);

        let import = CsvImport::parse("t1,p2\nreviewee,p3\n", 10).unwrap();
        assert_eq!(import.rows().len(), 2);
    }

    #[test]
    fn test_partial_success_with_unknown_reviewer() {
        let result = proposals("reviewee,reviewer\nt1,p2,p3\nt2,p3\nt3,ghost\n");
        let ok: Vec<_> = result.iter().filter_map(|p| p.as_ref().ok()).collect();
        let errors: Vec<_> = result.iter().filter_map(|p| p.as_ref().err()).collect();

        assert_eq!(ok.len(), 3);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, Some(4));
        assert_eq!(errors[0].reviewer.as_deref(), Some("ghost"));
    }

    #[test]
    fn test_unknown_reviewee_reports_once_per_row() {
        let result = proposals("nobody,p1,p2,p3\n");
        assert_eq!(result.len(), 1);
        assert!(result[0].is_err());
    }

    #[test]
    fn test_row_level_rejections() {
        let result = proposals("t1,p1\nt3,p4\nt2,p1\nt2, p1 \nt4\n");
        let messages: Vec<String> = result
            .iter()
            .map(|p| match p {
                Ok(pair) => format!("ok {}->{}", pair.reviewer_id, pair.reviewee_id),
                Err(e) => e.message.clone(),
            })
            .collect();

        assert_eq!(messages.len(), 5);
        assert!(messages[0].contains("own submission"));
        assert!(messages[1].contains("already assigned"));
        assert_eq!(messages[2], "ok 1->102");
        assert!(messages[3].contains("Duplicate pair"));
        assert!(messages[4].starts_with("Malformed row"));
    }

    #[test]
    fn test_file_level_errors() {
        assert!(matches!(
            CsvImport::parse("reviewee,reviewer\n", 10),
            Err(PeerReviewError::Validation(_))
        ));
        assert!(matches!(
            CsvImport::parse("t1,p2\nt2,p3\nt3,p1\n", 2),
            Err(PeerReviewError::Validation(_))
        ));
    }
}
