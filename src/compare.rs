use std::collections::HashMap;

use log::{info, warn};

use crate::{
    align::{AlignedRows, align_with},
    data::{Page, Row},
    diff::{ComparisonResult, DiffSummary, diff_with},
    filter::{FilterContext, FilterSet},
    join_index::JoinIndexes,
    relationship::{Relationship, TableRef},
    resolve::Resolver,
    virtual_columns::{InvalidVirtualColumn, Side, VirtualColumn, validate},
};

/// One side of a comparison as fetched from the table-data API.
#[derive(Debug, Clone, Default)]
pub struct SideInput {
    pub table: Option<TableRef>,
    pub page: Page,
    pub relationships: Vec<Relationship>,
    pub filters: FilterSet,
}

impl SideInput {
    pub fn new(page: Page) -> Self {
        SideInput {
            page,
            ..SideInput::default()
        }
    }

    pub fn with_table(mut self, table: TableRef) -> Self {
        self.table = Some(table);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComparisonRequest {
    pub left: SideInput,
    pub right: SideInput,
    /// Empty means: every column both sides can resolve.
    pub columns: Vec<String>,
    pub virtual_columns: Vec<VirtualColumn>,
    pub related_pages: HashMap<TableRef, Page>,
}

#[derive(Debug, Clone)]
pub struct ComparisonOutcome {
    pub columns: Vec<String>,
    pub aligned: AlignedRows,
    /// Aligned rows reduced to the comparison columns, virtual ones resolved.
    pub resolved: AlignedRows,
    pub results: Vec<ComparisonResult>,
    pub summary: DiffSummary,
    pub virtual_columns: Vec<VirtualColumn>,
    pub dropped: Vec<InvalidVirtualColumn>,
    pub left_filtered_out: usize,
    pub right_filtered_out: usize,
}

pub fn run_comparison(request: &ComparisonRequest) -> ComparisonOutcome {
    let left_columns = request.left.page.column_set();
    let right_columns = request.right.page.column_set();

    let report = validate(&request.virtual_columns, &left_columns, &right_columns);
    for invalid in &report.invalid {
        warn!(
            "Dropping {} virtual column '{}': {}",
            invalid.column.side(),
            invalid.column.name(),
            invalid.reason
        );
    }
    let virtual_columns = report.valid;

    let join_indexes = build_join_indexes(request, &virtual_columns);
    let left_resolver = Resolver::new(Side::Left, &virtual_columns, &join_indexes)
        .with_current_table(request.left.table.as_ref());
    let right_resolver = Resolver::new(Side::Right, &virtual_columns, &join_indexes)
        .with_current_table(request.right.table.as_ref());

    let left_rows = filter_side(&request.left, &left_resolver);
    let right_rows = filter_side(&request.right, &right_resolver);

    let columns = if request.columns.is_empty() {
        shared_columns(
            &effective_columns(&left_columns, &left_resolver),
            &effective_columns(&right_columns, &right_resolver),
        )
    } else {
        request.columns.clone()
    };

    let aligned = align_with(
        &left_rows,
        &right_rows,
        &columns,
        &left_columns,
        &right_columns,
        &left_resolver,
        &right_resolver,
    );
    let results = diff_with(
        &aligned.left,
        &aligned.right,
        &columns,
        &left_resolver,
        &right_resolver,
    );
    let resolved = AlignedRows {
        left: materialize_all(&aligned.left, &columns, &left_resolver),
        right: materialize_all(&aligned.right, &columns, &right_resolver),
    };
    let summary = DiffSummary::from_results(&results);
    info!(
        "Compared {} pair(s) on {} column(s): {} same, {} different, {} left-only, {} right-only",
        results.len(),
        columns.len(),
        summary.same,
        summary.different,
        summary.left_only,
        summary.right_only
    );

    ComparisonOutcome {
        left_filtered_out: request.left.page.rows.len() - left_rows.len(),
        right_filtered_out: request.right.page.rows.len() - right_rows.len(),
        columns,
        aligned,
        resolved,
        results,
        summary,
        virtual_columns,
        dropped: report.invalid,
    }
}

/// Indexes every table a joined column can reach, once per table.
fn build_join_indexes(request: &ComparisonRequest, virtual_columns: &[VirtualColumn]) -> JoinIndexes {
    let mut indexes = JoinIndexes::new();
    for relationship in virtual_columns.iter().filter_map(VirtualColumn::relationship) {
        for table in [relationship.pk_table_ref(), relationship.fk_table_ref()] {
            if indexes.contains(&table) {
                continue;
            }
            if let Some(page) = page_for_table(request, &table) {
                indexes.insert_page(table, page);
            }
        }
    }
    indexes
}

fn page_for_table<'r>(request: &'r ComparisonRequest, table: &TableRef) -> Option<&'r Page> {
    request
        .related_pages
        .iter()
        .find(|(candidate, _)| candidate.same_table(table))
        .map(|(_, page)| page)
        .or_else(|| {
            [&request.left, &request.right]
                .into_iter()
                .find(|side| side.table.as_ref().is_some_and(|t| t.same_table(table)))
                .map(|side| &side.page)
        })
}

fn materialize_all(rows: &[Row], columns: &[String], resolver: &Resolver<'_>) -> Vec<Row> {
    rows.iter()
        .map(|row| resolver.materialize(row, columns))
        .collect()
}

fn filter_side(side: &SideInput, resolver: &Resolver<'_>) -> Vec<Row> {
    let context = FilterContext::from_relationships(&side.relationships, side.table.as_ref());
    side.filters.apply(&side.page.rows, resolver, &context)
}

/// Original columns followed by this side's virtual column names.
pub fn effective_columns(columns: &[String], resolver: &Resolver<'_>) -> Vec<String> {
    let mut all = columns.to_vec();
    for name in resolver.virtual_names() {
        if !all.contains(&name) {
            all.push(name);
        }
    }
    all
}

/// Columns present on both sides, in left-side order.
pub fn shared_columns(left: &[String], right: &[String]) -> Vec<String> {
    left.iter()
        .filter(|column| right.contains(column))
        .cloned()
        .collect()
}
