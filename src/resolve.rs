use log::debug;

use crate::{
    data::{CellValue, Row},
    join_index::{JoinIndex, JoinIndexes},
    label,
    relationship::{Relationship, TableRef},
    virtual_columns::{Side, VirtualColumn},
};

/// Resolves columns of one side of a comparison.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    side: Side,
    virtual_columns: &'a [VirtualColumn],
    join_indexes: Option<&'a JoinIndexes>,
    current_table: Option<&'a TableRef>,
}

impl<'a> Resolver<'a> {
    pub fn new(side: Side, virtual_columns: &'a [VirtualColumn], join_indexes: &'a JoinIndexes) -> Self {
        Resolver {
            side,
            virtual_columns,
            join_indexes: Some(join_indexes),
            current_table: None,
        }
    }

    /// Resolver that only knows original columns.
    pub fn passthrough(side: Side) -> Self {
        Resolver {
            side,
            virtual_columns: &[],
            join_indexes: None,
            current_table: None,
        }
    }

    pub fn with_current_table(mut self, table: Option<&'a TableRef>) -> Self {
        self.current_table = table;
        self
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn virtual_column(&self, name: &str) -> Option<&'a VirtualColumn> {
        self.virtual_columns
            .iter()
            .find(|column| column.side() == self.side && column.name() == name)
    }

    pub fn is_joined(&self, name: &str) -> bool {
        matches!(self.virtual_column(name), Some(VirtualColumn::Joined { .. }))
    }

    /// Names of this side's virtual columns, in declaration order.
    pub fn virtual_names(&self) -> Vec<String> {
        self.virtual_columns
            .iter()
            .filter(|column| column.side() == self.side)
            .map(|column| column.name().to_string())
            .collect()
    }

    pub fn resolve(&self, row: &Row, column: &str) -> Option<CellValue> {
        match self.virtual_column(column) {
            Some(VirtualColumn::Combined { source_columns, .. }) => {
                Some(combine(row, source_columns))
            }
            Some(VirtualColumn::Joined {
                relationship,
                join_column,
                ..
            }) => Some(self.resolve_joined(row, relationship, join_column)),
            None => row.get(column).cloned(),
        }
    }

    /// A row holding the resolved value of each requested column.
    pub fn materialize(&self, row: &Row, columns: &[String]) -> Row {
        let mut resolved = Row::new();
        for column in columns {
            if let Some(value) = self.resolve(row, column) {
                resolved.insert(column.clone(), value);
            }
        }
        resolved
    }

    fn resolve_joined(&self, row: &Row, relationship: &Relationship, join_column: &str) -> CellValue {
        let Some(role) = relationship.role_for_row(row, self.current_table) else {
            return CellValue::Null;
        };
        let Some(key) = role.key_value(relationship, row) else {
            return CellValue::Null;
        };
        let related_table = role.related_table(relationship);
        let Some(index) = self.join_indexes.and_then(|indexes| indexes.get(&related_table)) else {
            debug!(
                "No join index for {} while resolving via '{}'",
                related_table, relationship.name
            );
            return CellValue::Null;
        };
        let raw = key.as_display();
        find_related(index, role.target_column(relationship), &raw)
            .and_then(|related| related.get(join_column).cloned())
            .unwrap_or(CellValue::Null)
    }
}

/// Non-blank source values, stringified and joined with a single space.
fn combine(row: &Row, sources: &[String]) -> CellValue {
    let parts: Vec<String> = sources
        .iter()
        .filter_map(|source| row.get(source))
        .filter(|value| !value.is_null())
        .map(CellValue::as_display)
        .filter(|text| !text.is_empty())
        .collect();
    CellValue::String(parts.join(" "))
}

/// Tries the indexed keys from most to least specific before scanning.
fn find_related<'i>(index: &'i JoinIndex, target_column: &str, raw: &str) -> Option<&'i Row> {
    let raw = raw.trim();
    let extracted = label::extract_id(raw);
    index
        .lookup_column(target_column, extracted)
        .or_else(|| index.lookup_key(extracted))
        .or_else(|| index.lookup_column(target_column, raw))
        .or_else(|| index.lookup_key(raw))
        .or_else(|| index.scan(target_column, &[extracted, raw]))
}

/// Free-function form of [`Resolver::resolve`] over an unfiltered column list.
pub fn resolve(
    row: &Row,
    column: &str,
    virtual_columns: &[VirtualColumn],
    join_indexes: &JoinIndexes,
    current_table: Option<&TableRef>,
) -> Option<CellValue> {
    let side = virtual_columns
        .iter()
        .find(|candidate| candidate.name() == column)
        .map(VirtualColumn::side)
        .unwrap_or(Side::Left);
    Resolver::new(side, virtual_columns, join_indexes)
        .with_current_table(current_table)
        .resolve(row, column)
}
