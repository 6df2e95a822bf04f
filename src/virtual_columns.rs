use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

use crate::relationship::Relationship;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum VirtualColumn {
    /// Non-empty source values joined by a single space.
    Combined {
        name: String,
        side: Side,
        source_columns: Vec<String>,
    },
    /// `join_column` of the related row reached through `relationship`.
    Joined {
        name: String,
        side: Side,
        relationship: Relationship,
        join_column: String,
    },
}

impl VirtualColumn {
    pub fn combined<S: Into<String>>(
        name: impl Into<String>,
        side: Side,
        sources: impl IntoIterator<Item = S>,
    ) -> Self {
        VirtualColumn::Combined {
            name: name.into(),
            side,
            source_columns: sources.into_iter().map(Into::into).collect(),
        }
    }

    pub fn joined(
        name: impl Into<String>,
        side: Side,
        relationship: Relationship,
        join_column: impl Into<String>,
    ) -> Self {
        VirtualColumn::Joined {
            name: name.into(),
            side,
            relationship,
            join_column: join_column.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            VirtualColumn::Combined { name, .. } | VirtualColumn::Joined { name, .. } => name,
        }
    }

    pub fn side(&self) -> Side {
        match self {
            VirtualColumn::Combined { side, .. } | VirtualColumn::Joined { side, .. } => *side,
        }
    }

    pub fn relationship(&self) -> Option<&Relationship> {
        match self {
            VirtualColumn::Joined { relationship, .. } => Some(relationship),
            VirtualColumn::Combined { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum InvalidReason {
    NoSourceColumns,
    MissingSourceColumns { columns: Vec<String> },
    CollidesWithColumn,
    DuplicateName,
    MissingJoinColumn,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::NoSourceColumns => write!(f, "no source columns listed"),
            InvalidReason::MissingSourceColumns { columns } => {
                write!(f, "source column(s) not found: {}", columns.join(", "))
            }
            InvalidReason::CollidesWithColumn => {
                write!(f, "name collides with an existing column")
            }
            InvalidReason::DuplicateName => write!(f, "name already used by another virtual column"),
            InvalidReason::MissingJoinColumn => write!(f, "join column is empty"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidVirtualColumn {
    pub column: VirtualColumn,
    #[serde(flatten)]
    pub reason: InvalidReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: Vec<VirtualColumn>,
    pub invalid: Vec<InvalidVirtualColumn>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty()
    }

    fn reject(&mut self, column: &VirtualColumn, reason: InvalidReason) {
        self.invalid.push(InvalidVirtualColumn {
            column: column.clone(),
            reason,
        });
    }
}

/// Partitions the combined columns in `columns` against one side's column set.
///
/// Joined entries are ignored; use [`validate`] for the full check.
pub fn validate_combined(columns: &[VirtualColumn], available: &[String]) -> ValidationReport {
    let mut report = ValidationReport::default();
    for column in columns {
        if let VirtualColumn::Combined { .. } = column {
            match check_combined(column, available) {
                Some(reason) => report.reject(column, reason),
                None => report.valid.push(column.clone()),
            }
        }
    }
    report
}

/// Validates every virtual column against the column set of its own side.
pub fn validate(
    columns: &[VirtualColumn],
    left_columns: &[String],
    right_columns: &[String],
) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen: HashSet<(Side, &str)> = HashSet::new();
    for column in columns {
        let available = match column.side() {
            Side::Left => left_columns,
            Side::Right => right_columns,
        };
        let reason = if !seen.insert((column.side(), column.name())) {
            Some(InvalidReason::DuplicateName)
        } else {
            match column {
                VirtualColumn::Combined { .. } => check_combined(column, available),
                VirtualColumn::Joined { name, join_column, .. } => {
                    if available.iter().any(|c| c == name) {
                        Some(InvalidReason::CollidesWithColumn)
                    } else if join_column.trim().is_empty() {
                        Some(InvalidReason::MissingJoinColumn)
                    } else {
                        None
                    }
                }
            }
        };
        match reason {
            Some(reason) => report.reject(column, reason),
            None => report.valid.push(column.clone()),
        }
    }
    report
}

fn check_combined(column: &VirtualColumn, available: &[String]) -> Option<InvalidReason> {
    let VirtualColumn::Combined {
        name,
        source_columns,
        ..
    } = column
    else {
        return None;
    };
    if available.iter().any(|c| c == name) {
        return Some(InvalidReason::CollidesWithColumn);
    }
    if source_columns.is_empty() {
        return Some(InvalidReason::NoSourceColumns);
    }
    let missing: Vec<String> = source_columns
        .iter()
        .filter(|source| !available.contains(source))
        .cloned()
        .collect();
    if missing.is_empty() {
        None
    } else {
        Some(InvalidReason::MissingSourceColumns { columns: missing })
    }
}
