use std::collections::{HashMap, hash_map::Entry};

use log::debug;

use crate::{
    data::{Page, Row},
    normalize::normalize,
    relationship::TableRef,
};

pub const PRIMARY_KEY_COLUMN: &str = "Oid";

pub fn composite_key(column: &str, value: &str) -> String {
    format!("{column}:{}", normalize(value))
}

#[derive(Debug, Clone, Default)]
pub struct JoinIndex {
    rows: Vec<Row>,
    by_key: HashMap<String, usize>,
    by_column_value: HashMap<String, usize>,
    collisions: usize,
}

impl JoinIndex {
    pub fn build(rows: &[Row]) -> Self {
        let mut index = JoinIndex {
            rows: rows.to_vec(),
            ..JoinIndex::default()
        };
        for (position, row) in rows.iter().enumerate() {
            if let Some(key) = primary_key_value(row) {
                if let Entry::Vacant(slot) = index.by_key.entry(key) {
                    slot.insert(position);
                } else {
                    index.collisions += 1;
                }
            }
            for (column, value) in row.iter() {
                if value.is_null() {
                    continue;
                }
                let display = value.as_display();
                if display.is_empty() {
                    continue;
                }
                match index.by_column_value.entry(composite_key(column, &display)) {
                    Entry::Vacant(slot) => {
                        slot.insert(position);
                    }
                    Entry::Occupied(slot) => {
                        index.collisions += 1;
                        debug!(
                            "Join index key '{}' already claimed by row {}; row {} not indexed under it",
                            slot.key(),
                            slot.get(),
                            position
                        );
                    }
                }
            }
        }
        debug!(
            "Built join index over {} row(s): {} primary key(s), {} column key(s), {} collision(s)",
            index.rows.len(),
            index.by_key.len(),
            index.by_column_value.len(),
            index.collisions
        );
        index
    }

    /// Bare-value lookup against the primary key.
    pub fn lookup_key(&self, key: &str) -> Option<&Row> {
        self.by_key.get(key).map(|&pos| &self.rows[pos])
    }

    /// Lookup by `"<column>:<normalized value>"`.
    pub fn lookup_column(&self, column: &str, value: &str) -> Option<&Row> {
        self.by_column_value
            .get(&composite_key(column, value))
            .map(|&pos| &self.rows[pos])
    }

    /// Linear scan for the first row whose `column` equals any candidate.
    pub fn scan(&self, column: &str, candidates: &[&str]) -> Option<&Row> {
        self.rows.iter().find(|row| {
            row.get_non_null(column)
                .map(|value| {
                    let display = value.as_display();
                    candidates.iter().any(|c| display.trim() == c.trim())
                })
                .unwrap_or(false)
        })
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn collisions(&self) -> usize {
        self.collisions
    }
}

fn primary_key_value(row: &Row) -> Option<String> {
    let value = match row.get_non_null(PRIMARY_KEY_COLUMN) {
        Some(value) => value,
        None => row
            .iter()
            .find(|(column, value)| {
                column.eq_ignore_ascii_case(PRIMARY_KEY_COLUMN) && !value.is_null()
            })
            .map(|(_, value)| value)?,
    };
    let display = value.as_display();
    let trimmed = display.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Join indexes keyed by the table they were built from.
#[derive(Debug, Clone, Default)]
pub struct JoinIndexes {
    by_table: HashMap<TableRef, JoinIndex>,
}

impl JoinIndexes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: TableRef, index: JoinIndex) {
        self.by_table.insert(table, index);
    }

    pub fn insert_page(&mut self, table: TableRef, page: &Page) {
        self.insert(table, JoinIndex::build(&page.rows));
    }

    pub fn get(&self, table: &TableRef) -> Option<&JoinIndex> {
        self.by_table.get(table).or_else(|| {
            self.by_table
                .iter()
                .find(|(candidate, _)| candidate.same_table(table))
                .map(|(_, index)| index)
        })
    }

    pub fn contains(&self, table: &TableRef) -> bool {
        self.get(table).is_some()
    }

    pub fn len(&self) -> usize {
        self.by_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_table.is_empty()
    }
}
