use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    compare::{ComparisonRequest, SideInput},
    data::{CellValue, Page, Row},
    error::CompareError,
    filter::FilterSet,
    relationship::{Relationship, TableRef},
    virtual_columns::{Side, VirtualColumn},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonConfig {
    #[serde(default)]
    pub left: SideConfig,
    #[serde(default)]
    pub right: SideConfig,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub virtual_columns: Vec<VirtualColumn>,
    #[serde(default)]
    pub related: Vec<RelatedPageConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideConfig {
    #[serde(default)]
    pub table: Option<TableRef>,
    #[serde(default)]
    pub page: Option<PathBuf>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub filters: FilterSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedPageConfig {
    pub table: TableRef,
    pub page: PathBuf,
}

impl ComparisonConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let mut config: ComparisonConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config file {path:?}"))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Makes relative page paths relative to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let rebase = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        for side in [&mut self.left, &mut self.right] {
            if let Some(page) = side.page.as_mut() {
                rebase(page);
            }
        }
        for related in &mut self.related {
            rebase(&mut related.page);
        }
    }

    /// Loads every page the configuration points at.
    pub fn into_request(self) -> Result<ComparisonRequest> {
        let left = load_side(self.left, Side::Left)?;
        let right = load_side(self.right, Side::Right)?;
        let mut related_pages = HashMap::new();
        for related in self.related {
            let page = load_page(&related.page)
                .with_context(|| format!("Loading related page for {}", related.table))?;
            related_pages.insert(related.table, page);
        }
        Ok(ComparisonRequest {
            left,
            right,
            columns: self.columns,
            virtual_columns: self.virtual_columns,
            related_pages,
        })
    }
}

fn load_side(config: SideConfig, side: Side) -> Result<SideInput> {
    let path = config.page.ok_or(CompareError::MissingPage(side))?;
    let page = load_page(&path).with_context(|| format!("Loading {side} page"))?;
    Ok(SideInput {
        table: config.table,
        page,
        relationships: config.relationships,
        filters: config.filters,
    })
}

pub fn load_page(path: &Path) -> Result<Page> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let page = match extension.as_deref() {
        Some("json") => {
            let file = File::open(path).with_context(|| format!("Opening page {path:?}"))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Parsing JSON page {path:?}"))?
        }
        Some("csv") => {
            let file = File::open(path).with_context(|| format!("Opening page {path:?}"))?;
            read_csv_page(file).with_context(|| format!("Parsing CSV page {path:?}"))?
        }
        _ => return Err(CompareError::UnsupportedPageFormat(path.to_path_buf()).into()),
    };
    debug!(
        "Loaded {} row(s) across {} column(s) from {:?}",
        page.rows.len(),
        page.column_set().len(),
        path
    );
    Ok(page)
}

pub fn read_csv_page<R: Read>(reader: R) -> Result<Page> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let columns: Vec<String> = csv_reader
        .headers()
        .context("Reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut rows = Vec::new();
    for (row_idx, record) in csv_reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading CSV row {}", row_idx + 2))?;
        let mut row = Row::new();
        for (idx, column) in columns.iter().enumerate() {
            let value = match record.get(idx) {
                Some(field) if !field.is_empty() => CellValue::String(field.to_string()),
                _ => CellValue::Null,
            };
            row.insert(column.clone(), value);
        }
        rows.push(row);
    }
    Ok(Page::new(columns, rows))
}
