use std::collections::HashMap;

use itertools::Itertools;
use log::debug;

use crate::{
    data::{CellValue, Row},
    normalize::collate,
    resolve::Resolver,
    virtual_columns::Side,
};

const KEY_SEPARATOR: &str = "|";
const NULL_KEY: &str = "null";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedRows {
    pub left: Vec<Row>,
    pub right: Vec<Row>,
}

impl AlignedRows {
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&Row, &Row)> {
        self.left.iter().zip(self.right.iter())
    }
}

/// Aligns rows on original columns only.
pub fn align(
    left_rows: &[Row],
    right_rows: &[Row],
    comparison_columns: &[String],
    left_columns: &[String],
    right_columns: &[String],
) -> AlignedRows {
    align_with(
        left_rows,
        right_rows,
        comparison_columns,
        left_columns,
        right_columns,
        &Resolver::passthrough(Side::Left),
        &Resolver::passthrough(Side::Right),
    )
}

pub fn align_with(
    left_rows: &[Row],
    right_rows: &[Row],
    comparison_columns: &[String],
    left_columns: &[String],
    right_columns: &[String],
    left_resolver: &Resolver<'_>,
    right_resolver: &Resolver<'_>,
) -> AlignedRows {
    let left_padding = padding_columns(left_columns, left_rows);
    let right_padding = padding_columns(right_columns, right_rows);

    if comparison_columns.is_empty() {
        let mut left = left_rows.to_vec();
        let mut right = right_rows.to_vec();
        let target = left.len().max(right.len());
        left.resize_with(target, || Row::null_row(&left_padding));
        right.resize_with(target, || Row::null_row(&right_padding));
        return AlignedRows { left, right };
    }

    let (left_order, left_buckets) = bucket_rows(left_rows, comparison_columns, left_resolver);
    let (right_order, right_buckets) = bucket_rows(right_rows, comparison_columns, right_resolver);

    let keys = left_order
        .iter()
        .chain(right_order.iter())
        .unique()
        .sorted_by(|a, b| collate(a, b))
        .collect::<Vec<_>>();

    let mut aligned = AlignedRows::default();
    for key in keys {
        let left_bucket = left_buckets.get(key.as_str()).map(Vec::as_slice).unwrap_or_default();
        let right_bucket = right_buckets.get(key.as_str()).map(Vec::as_slice).unwrap_or_default();
        let width = left_bucket.len().max(right_bucket.len());
        for slot in 0..width {
            aligned.left.push(match left_bucket.get(slot) {
                Some(&position) => left_rows[position].clone(),
                None => Row::null_row(&left_padding),
            });
            aligned.right.push(match right_bucket.get(slot) {
                Some(&position) => right_rows[position].clone(),
                None => Row::null_row(&right_padding),
            });
        }
    }
    debug!(
        "Aligned {} left and {} right row(s) into {} pair(s)",
        left_rows.len(),
        right_rows.len(),
        aligned.len()
    );
    aligned
}

/// Composite key over `columns`: nulls as `null`, strings lower-cased,
/// non-scalars in stable serialized form.
pub fn sort_key(row: &Row, columns: &[String], resolver: &Resolver<'_>) -> String {
    columns
        .iter()
        .map(|column| key_part(resolver.resolve(row, column).as_ref()))
        .join(KEY_SEPARATOR)
}

fn key_part(value: Option<&CellValue>) -> String {
    match value {
        None | Some(CellValue::Null) => NULL_KEY.to_string(),
        Some(CellValue::String(s)) => s.to_lowercase(),
        Some(other) if !other.is_scalar() => other.stable_serialize(),
        Some(other) => other.as_display(),
    }
}

/// Bucket positions per key, plus keys in first-seen order.
fn bucket_rows(
    rows: &[Row],
    columns: &[String],
    resolver: &Resolver<'_>,
) -> (Vec<String>, HashMap<String, Vec<usize>>) {
    let mut order = Vec::new();
    let mut buckets: HashMap<String, Vec<usize>> = HashMap::new();
    for (position, row) in rows.iter().enumerate() {
        let key = sort_key(row, columns, resolver);
        let bucket = buckets.entry(key.clone()).or_default();
        if bucket.is_empty() {
            order.push(key);
        }
        bucket.push(position);
    }
    (order, buckets)
}

fn padding_columns(declared: &[String], rows: &[Row]) -> Vec<String> {
    if !declared.is_empty() {
        return declared.to_vec();
    }
    rows.iter()
        .flat_map(|row| row.columns().cloned())
        .unique()
        .collect()
}
