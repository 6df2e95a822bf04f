use std::fmt;

use serde::Serialize;

use crate::{
    data::{Row, stable_serialize},
    resolve::Resolver,
    virtual_columns::Side,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowStatus {
    Same,
    Different,
    LeftOnly,
    RightOnly,
}

impl RowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RowStatus::Same => "same",
            RowStatus::Different => "different",
            RowStatus::LeftOnly => "left-only",
            RowStatus::RightOnly => "right-only",
        }
    }

    /// Status seen from the other side of the comparison.
    pub fn mirrored(self) -> RowStatus {
        match self {
            RowStatus::LeftOnly => RowStatus::RightOnly,
            RowStatus::RightOnly => RowStatus::LeftOnly,
            other => other,
        }
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_row: Option<Row>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_row: Option<Row>,
    pub status: RowStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diff_columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub same: usize,
    pub different: usize,
    pub left_only: usize,
    pub right_only: usize,
}

impl DiffSummary {
    pub fn from_results(results: &[ComparisonResult]) -> Self {
        let mut summary = DiffSummary::default();
        for result in results {
            match result.status {
                RowStatus::Same => summary.same += 1,
                RowStatus::Different => summary.different += 1,
                RowStatus::LeftOnly => summary.left_only += 1,
                RowStatus::RightOnly => summary.right_only += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.same + self.different + self.left_only + self.right_only
    }

    pub fn has_differences(&self) -> bool {
        self.total() != self.same
    }
}

/// Diffs aligned rows on original columns only.
pub fn diff(aligned_left: &[Row], aligned_right: &[Row], comparison_columns: &[String]) -> Vec<ComparisonResult> {
    diff_with(
        aligned_left,
        aligned_right,
        comparison_columns,
        &Resolver::passthrough(Side::Left),
        &Resolver::passthrough(Side::Right),
    )
}

/// Classifies each aligned pair. A missing index on either side counts as
/// padding, so mismatched lengths never panic.
pub fn diff_with(
    aligned_left: &[Row],
    aligned_right: &[Row],
    comparison_columns: &[String],
    left_resolver: &Resolver<'_>,
    right_resolver: &Resolver<'_>,
) -> Vec<ComparisonResult> {
    let length = aligned_left.len().max(aligned_right.len());
    (0..length)
        .map(|index| {
            let left = aligned_left.get(index).filter(|row| !row.is_padding());
            let right = aligned_right.get(index).filter(|row| !row.is_padding());
            let (status, diff_columns) = match (left, right) {
                (Some(_), None) => (RowStatus::LeftOnly, Vec::new()),
                (None, Some(_)) => (RowStatus::RightOnly, Vec::new()),
                (None, None) => (RowStatus::Same, Vec::new()),
                (Some(l), Some(r)) => {
                    let changed = differing_columns(l, r, comparison_columns, left_resolver, right_resolver);
                    let status = if changed.is_empty() {
                        RowStatus::Same
                    } else {
                        RowStatus::Different
                    };
                    (status, changed)
                }
            };
            ComparisonResult {
                index,
                left_row: left.cloned(),
                right_row: right.cloned(),
                status,
                diff_columns,
            }
        })
        .collect()
}

fn differing_columns(
    left: &Row,
    right: &Row,
    columns: &[String],
    left_resolver: &Resolver<'_>,
    right_resolver: &Resolver<'_>,
) -> Vec<String> {
    columns
        .iter()
        .filter(|column| {
            let a = left_resolver.resolve(left, column);
            let b = right_resolver.resolve(right, column);
            stable_serialize(a.as_ref()) != stable_serialize(b.as_ref())
        })
        .cloned()
        .collect()
}
