use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::{CellValue, Row};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        TableRef {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Case-insensitive comparison, matching how SQL identifiers usually resolve.
    pub fn same_table(&self, other: &TableRef) -> bool {
        self.schema.eq_ignore_ascii_case(&other.schema)
            && self.table.eq_ignore_ascii_case(&other.table)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// A foreign key (many side) pointing at a primary key (one side).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub fk_schema: String,
    pub fk_table: String,
    pub fk_column: String,
    pub pk_schema: String,
    pub pk_table: String,
    pub pk_column: String,
    #[serde(default)]
    pub name: String,
}

impl Relationship {
    pub fn fk_table_ref(&self) -> TableRef {
        TableRef::new(&self.fk_schema, &self.fk_table)
    }

    pub fn pk_table_ref(&self) -> TableRef {
        TableRef::new(&self.pk_schema, &self.pk_table)
    }

    /// Role a table plays in this relationship, when it plays exactly one.
    pub fn role_of_table(&self, table: &TableRef) -> Option<RelationshipRole> {
        let is_fk = self.fk_table_ref().same_table(table);
        let is_pk = self.pk_table_ref().same_table(table);
        match (is_fk, is_pk) {
            (true, false) => Some(RelationshipRole::ForeignKey),
            (false, true) => Some(RelationshipRole::PrimaryKey),
            _ => None,
        }
    }

    /// Picks the role `row` plays.
    ///
    /// When `current_table` plays exactly one role in this relationship that
    /// role wins, even if the row's own key is null. Otherwise a row holding
    /// exactly one of the two key columns decides on its own, and a row
    /// holding both takes the foreign-key role. A row holding neither has no
    /// role.
    pub fn role_for_row(
        &self,
        row: &Row,
        current_table: Option<&TableRef>,
    ) -> Option<RelationshipRole> {
        let has_fk = row.get_non_null(&self.fk_column).is_some();
        let has_pk = row.get_non_null(&self.pk_column).is_some();
        let structural = match (has_fk, has_pk) {
            (true, false) | (true, true) => RelationshipRole::ForeignKey,
            (false, true) => RelationshipRole::PrimaryKey,
            (false, false) => return None,
        };
        Some(
            current_table
                .and_then(|table| self.role_of_table(table))
                .unwrap_or(structural),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipRole {
    ForeignKey,
    PrimaryKey,
}

impl RelationshipRole {
    /// Column read from the row being resolved.
    pub fn own_column(self, relationship: &Relationship) -> &str {
        match self {
            RelationshipRole::ForeignKey => &relationship.fk_column,
            RelationshipRole::PrimaryKey => &relationship.pk_column,
        }
    }

    /// Column matched against in the related table.
    pub fn target_column(self, relationship: &Relationship) -> &str {
        match self {
            RelationshipRole::ForeignKey => &relationship.pk_column,
            RelationshipRole::PrimaryKey => &relationship.fk_column,
        }
    }

    pub fn related_table(self, relationship: &Relationship) -> TableRef {
        match self {
            RelationshipRole::ForeignKey => relationship.pk_table_ref(),
            RelationshipRole::PrimaryKey => relationship.fk_table_ref(),
        }
    }

    pub fn key_value<'r>(self, relationship: &Relationship, row: &'r Row) -> Option<&'r CellValue> {
        row.get_non_null(self.own_column(relationship))
    }
}
