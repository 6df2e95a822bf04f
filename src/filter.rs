use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    data::{CellValue, Row},
    error::CompareError,
    label,
    normalize::normalize,
    relationship::{Relationship, TableRef},
    resolve::Resolver,
};

pub const ALTERNATIVE_SEPARATOR: &str = "||";
pub const ORIGINAL_ID_SUFFIX: &str = "_OriginalId";
const NULL_LITERALS: &[&str] = &["", "null", "(null)"];

pub fn original_id_column(column: &str) -> String {
    format!("{column}{ORIGINAL_ID_SUFFIX}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpression {
    alternatives: Vec<String>,
}

impl FilterExpression {
    pub fn parse(expression: &str) -> Self {
        FilterExpression {
            alternatives: expression
                .split(ALTERNATIVE_SEPARATOR)
                .map(str::trim)
                .filter(|alt| !alt.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    pub fn matches_everything(&self) -> bool {
        self.alternatives.is_empty()
    }
}

/// Columns backed by a foreign-key relationship on the side being filtered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterContext {
    relationship_columns: HashSet<String>,
}

impl FilterContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_relationship_column(mut self, column: impl Into<String>) -> Self {
        self.relationship_columns.insert(column.into());
        self
    }

    /// Flags every fk column `table` owns, or every fk column when the table is unknown.
    pub fn from_relationships(relationships: &[Relationship], table: Option<&TableRef>) -> Self {
        let relationship_columns = relationships
            .iter()
            .filter(|rel| table.is_none_or(|t| rel.fk_table_ref().same_table(t)))
            .map(|rel| rel.fk_column.clone())
            .collect();
        FilterContext {
            relationship_columns,
        }
    }

    pub fn is_relationship(&self, column: &str) -> bool {
        self.relationship_columns.contains(column)
    }
}

/// A non-null cell prepared for tier evaluation.
pub struct Candidate {
    pub raw: String,
    pub display: String,
    pub original_id: Option<String>,
    pub is_relationship: bool,
}

impl Candidate {
    pub fn new(cell: &CellValue, original_id: Option<&CellValue>, is_relationship: bool) -> Self {
        let raw = cell.as_display();
        let display = label::display_portion(&raw).to_string();
        Candidate {
            display,
            raw,
            original_id: original_id
                .filter(|id| !id.is_null())
                .map(|id| id.as_display().trim().to_string()),
            is_relationship,
        }
    }
}

/// One trimmed alternative and its normalized form.
pub struct Alternative {
    pub text: String,
    pub normalized: String,
}

impl Alternative {
    pub fn new(text: &str) -> Self {
        let text = text.trim();
        Alternative {
            text: text.to_string(),
            normalized: normalize(text),
        }
    }
}

pub struct MatchTier {
    pub name: &'static str,
    pub predicate: fn(&Candidate, &Alternative) -> bool,
}

pub const MATCH_TIERS: &[MatchTier] = &[
    MatchTier {
        name: "exact",
        predicate: exact_raw,
    },
    MatchTier {
        name: "display",
        predicate: exact_display,
    },
    MatchTier {
        name: "original-id",
        predicate: exact_original_id,
    },
    MatchTier {
        name: "label",
        predicate: exact_label,
    },
    MatchTier {
        name: "collapsed",
        predicate: exact_collapsed,
    },
    MatchTier {
        name: "relationship-partial",
        predicate: relationship_partial,
    },
    MatchTier {
        name: "partial",
        predicate: generic_partial,
    },
];

fn exact_raw(candidate: &Candidate, alt: &Alternative) -> bool {
    candidate.raw.trim() == alt.text
}

fn exact_display(candidate: &Candidate, alt: &Alternative) -> bool {
    candidate.display == alt.text
}

fn exact_original_id(candidate: &Candidate, alt: &Alternative) -> bool {
    candidate.original_id.as_deref() == Some(alt.text.as_str())
}

fn exact_label(candidate: &Candidate, alt: &Alternative) -> bool {
    let (Some(parsed), Some(original_id)) = (label::parse_label(&alt.text), &candidate.original_id)
    else {
        return false;
    };
    candidate.display == parsed.display && original_id == parsed.id
}

/// An `"X (ID: n)"` alternative whose id disagrees with the companion id.
fn contradicts_label(candidate: &Candidate, alt: &Alternative) -> bool {
    match (label::parse_label(&alt.text), candidate.original_id.as_deref()) {
        (Some(parsed), Some(original_id)) => parsed.id != original_id,
        _ => false,
    }
}

fn exact_collapsed(candidate: &Candidate, alt: &Alternative) -> bool {
    !contradicts_label(candidate, alt)
        && label::collapse_newlines(&candidate.raw) == label::collapse_newlines(&alt.text)
}

fn relationship_partial(candidate: &Candidate, alt: &Alternative) -> bool {
    let Some(original_id) = candidate.original_id.as_deref() else {
        return false;
    };
    if !candidate.is_relationship || contradicts_label(candidate, alt) {
        return false;
    }
    normalize(&candidate.display).contains(&alt.normalized)
        || normalize(original_id).contains(&alt.normalized)
}

fn generic_partial(candidate: &Candidate, alt: &Alternative) -> bool {
    if contradicts_label(candidate, alt) {
        return false;
    }
    normalize(&candidate.raw).contains(&alt.normalized)
        || candidate
            .raw
            .to_lowercase()
            .contains(&alt.text.to_lowercase())
}

fn null_matches(alt: &Alternative) -> bool {
    NULL_LITERALS.contains(&alt.normalized.as_str())
}

/// Name of the first tier accepting `alternative`, or `None` when none does.
pub fn matching_tier(
    cell: Option<&CellValue>,
    original_id: Option<&CellValue>,
    alternative: &str,
    is_relationship: bool,
) -> Option<&'static str> {
    let alt = Alternative::new(alternative);
    let cell = match cell {
        None | Some(CellValue::Null) => {
            return null_matches(&alt).then_some("null");
        }
        Some(cell) => cell,
    };
    let candidate = Candidate::new(cell, original_id, is_relationship);
    MATCH_TIERS
        .iter()
        .find(|tier| (tier.predicate)(&candidate, &alt))
        .map(|tier| tier.name)
}

pub fn matches_cell(
    cell: Option<&CellValue>,
    original_id: Option<&CellValue>,
    expression: &FilterExpression,
    is_relationship: bool,
) -> bool {
    if expression.matches_everything() {
        return true;
    }
    expression
        .alternatives()
        .iter()
        .any(|alt| matching_tier(cell, original_id, alt, is_relationship).is_some())
}

/// Whether `row[column]` satisfies `expression`.
pub fn matches(row: &Row, column: &str, expression: &str, context: &FilterContext) -> bool {
    matches_cell(
        row.get(column),
        row.get(&original_id_column(column)),
        &FilterExpression::parse(expression),
        context.is_relationship(column),
    )
}

/// Column filters for one side; every column's expression must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    filters: BTreeMap<String, String>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        FilterSet {
            filters: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parses `column=expression` clauses as given on the command line.
    pub fn parse_clauses(clauses: &[String]) -> Result<Self> {
        let mut set = FilterSet::new();
        for clause in clauses {
            let (column, expression) = parse_clause(clause)?;
            set.insert(column, expression);
        }
        Ok(set)
    }

    pub fn insert(&mut self, column: impl Into<String>, expression: impl Into<String>) {
        self.filters.insert(column.into(), expression.into());
    }

    pub fn merge(&mut self, other: FilterSet) {
        self.filters.extend(other.filters);
    }

    /// Columns whose expression has at least one non-empty alternative.
    pub fn active(&self) -> impl Iterator<Item = (&str, FilterExpression)> {
        self.filters
            .iter()
            .map(|(column, expression)| (column.as_str(), FilterExpression::parse(expression)))
            .filter(|(_, expression)| !expression.matches_everything())
    }

    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }

    pub fn row_matches(&self, row: &Row, resolver: &Resolver<'_>, context: &FilterContext) -> bool {
        self.active().all(|(column, expression)| {
            let cell = resolver.resolve(row, column);
            let original_id = row.get(&original_id_column(column));
            let is_relationship = context.is_relationship(column) || resolver.is_joined(column);
            matches_cell(cell.as_ref(), original_id, &expression, is_relationship)
        })
    }

    pub fn apply(&self, rows: &[Row], resolver: &Resolver<'_>, context: &FilterContext) -> Vec<Row> {
        if self.is_empty() {
            return rows.to_vec();
        }
        let kept: Vec<Row> = rows
            .iter()
            .filter(|row| self.row_matches(row, resolver, context))
            .cloned()
            .collect();
        debug!(
            "Filters on the {} side kept {} of {} row(s)",
            resolver.side(),
            kept.len(),
            rows.len()
        );
        kept
    }
}

fn parse_clause(clause: &str) -> Result<(String, String)> {
    let Some((column, expression)) = clause.split_once('=') else {
        return Err(CompareError::InvalidFilterClause(clause.to_string()).into());
    };
    let column = column.trim();
    if column.is_empty() {
        return Err(CompareError::InvalidFilterClause(clause.to_string()).into());
    }
    Ok((column.to_string(), unquote(expression.trim()).to_string()))
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        if (bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\'')
        {
            return &value[1..value.len() - 1];
        }
    }
    value
}
