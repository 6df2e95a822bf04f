#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use table_compare::data::{CellValue, Row};
use table_compare::relationship::Relationship;
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Builds a row of string cells.
pub fn row(pairs: &[(&str, &str)]) -> Row {
    Row::from_pairs(pairs.iter().map(|(k, v)| (*k, CellValue::from(*v))))
}

pub fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// `dbo.Order.Customer -> dbo.Customer.Oid`
pub fn order_customer() -> Relationship {
    Relationship {
        fk_schema: "dbo".into(),
        fk_table: "Order".into(),
        fk_column: "Customer".into(),
        pk_schema: "dbo".into(),
        pk_table: "Customer".into(),
        pk_column: "Oid".into(),
        name: "FK_Order_Customer".into(),
    }
}

pub fn customers() -> Vec<Row> {
    vec![
        row(&[("Oid", "41"), ("Name", "Trần Thị B"), ("City", "Huế")]),
        row(&[("Oid", "42"), ("Name", "Nguyễn Văn A"), ("City", "Hà Nội")]),
        row(&[("Oid", "43"), ("Name", "Lê Văn C"), ("City", "Đà Nẵng")]),
    ]
}
