//! Cell values, rows, and fetched pages.
//!
//! A [`Page`] mirrors what the table-data API hands back for a
//! `(source, schema, table, limit, offset)` request: the column list, the rows,
//! and pagination hints. Rows are immutable snapshots keyed by column name.
//!
//! [`CellValue::stable_serialize`] is the structural form used for equality in
//! the diff and for non-scalar sort keys; nested object keys are always emitted
//! in sorted order and whole floats are written as integers.

use std::{collections::BTreeMap, fmt};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as JsonValue};
use sha2::{Digest, Sha256};

/// Largest integer a float can hold without losing precision (2^53).
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Describes a binary cell without carrying its bytes around.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobDescriptor {
    pub byte_len: usize,
    pub sha256: String,
}

impl BlobDescriptor {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let sha256 = digest.iter().map(|b| format!("{b:02x}")).collect();
        BlobDescriptor {
            byte_len: bytes.len(),
            sha256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "JsonValue", into = "JsonValue")]
pub enum CellValue {
    Null,
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Binary(BlobDescriptor),
    Json(JsonValue),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, CellValue::Binary(_) | CellValue::Json(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Text rendering used for matching, key building, and combined columns.
    pub fn as_display(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::String(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => {
                if f.fract() == 0.0 && f.abs() < MAX_EXACT_FLOAT_INT {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            CellValue::Boolean(b) => b.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
            CellValue::Binary(_) | CellValue::Json(_) => self.stable_serialize(),
        }
    }

    /// Canonical JSON form: sorted object keys, whole floats as integers.
    pub fn to_canonical_json(&self) -> JsonValue {
        match self {
            CellValue::Null => JsonValue::Null,
            CellValue::String(s) => JsonValue::String(s.clone()),
            CellValue::Integer(i) => JsonValue::Number((*i).into()),
            CellValue::Float(f) => canonical_float(*f),
            CellValue::Boolean(b) => JsonValue::Bool(*b),
            CellValue::Date(_) | CellValue::DateTime(_) => JsonValue::String(self.as_display()),
            CellValue::Binary(blob) => {
                let mut map = Map::new();
                map.insert("byteLen".into(), JsonValue::Number(blob.byte_len.into()));
                map.insert("sha256".into(), JsonValue::String(blob.sha256.clone()));
                JsonValue::Object(map)
            }
            CellValue::Json(value) => canonicalize_json(value),
        }
    }

    pub fn stable_serialize(&self) -> String {
        self.to_canonical_json().to_string()
    }
}

/// Serializes an optional cell; an absent value serializes like null.
pub fn stable_serialize(value: Option<&CellValue>) -> String {
    value
        .map(CellValue::stable_serialize)
        .unwrap_or_else(|| "null".to_string())
}

fn canonical_float(value: f64) -> JsonValue {
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_FLOAT_INT {
        JsonValue::Number((value as i64).into())
    } else {
        Number::from_f64(value)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

fn canonicalize_json(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => JsonValue::Number(i.into()),
            (None, Some(f)) if n.as_u64().is_none() => canonical_float(f),
            _ => JsonValue::Number(n.clone()),
        },
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(canonicalize_json).collect()),
        JsonValue::Object(map) => {
            let sorted: BTreeMap<&String, JsonValue> = map
                .iter()
                .map(|(key, inner)| (key, canonicalize_json(inner)))
                .collect();
            let mut out = Map::new();
            for (key, inner) in sorted {
                out.insert(key.clone(), inner);
            }
            JsonValue::Object(out)
        }
        other => other.clone(),
    }
}

/// Recognizes the `{"type":"Buffer","data":[..]}` shape drivers emit for blobs.
fn blob_from_json(map: &Map<String, JsonValue>) -> Option<BlobDescriptor> {
    if map.len() != 2 || map.get("type").and_then(JsonValue::as_str) != Some("Buffer") {
        return None;
    }
    let data = map.get("data")?.as_array()?;
    let bytes = data
        .iter()
        .map(|b| b.as_u64().and_then(|v| u8::try_from(v).ok()))
        .collect::<Option<Vec<u8>>>()?;
    Some(BlobDescriptor::from_bytes(&bytes))
}

impl From<JsonValue> for CellValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => CellValue::Null,
            JsonValue::Bool(b) => CellValue::Boolean(b),
            JsonValue::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => CellValue::Integer(i),
                // Unsigned ids past i64::MAX stay exact.
                (None, Some(_)) => CellValue::Json(JsonValue::Number(n)),
                (None, None) => CellValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => CellValue::String(s),
            JsonValue::Object(map) => match blob_from_json(&map) {
                Some(blob) => CellValue::Binary(blob),
                None => CellValue::Json(JsonValue::Object(map)),
            },
            array @ JsonValue::Array(_) => CellValue::Json(array),
        }
    }
}

impl From<CellValue> for JsonValue {
    fn from(value: CellValue) -> Self {
        value.to_canonical_json()
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "null"),
            other => write!(f, "{}", other.as_display()),
        }
    }
}

/// One fetched row. Padding rows are synthesized by alignment and carry
/// only nulls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, CellValue>",
    into = "BTreeMap<String, CellValue>"
)]
pub struct Row {
    values: BTreeMap<String, CellValue>,
    padding: bool,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<CellValue>,
    {
        Row {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            padding: false,
        }
    }

    /// Builds a padding row with every known column mapped to null.
    pub fn null_row(columns: &[String]) -> Self {
        Row {
            values: columns
                .iter()
                .map(|c| (c.clone(), CellValue::Null))
                .collect(),
            padding: true,
        }
    }

    pub fn is_padding(&self) -> bool {
        self.padding
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.values.get(column)
    }

    /// Value of `column` when present and not null.
    pub fn get_non_null(&self, column: &str) -> Option<&CellValue> {
        self.values.get(column).filter(|v| !v.is_null())
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CellValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<BTreeMap<String, CellValue>> for Row {
    fn from(values: BTreeMap<String, CellValue>) -> Self {
        Row {
            values,
            padding: false,
        }
    }
}

impl From<Row> for BTreeMap<String, CellValue> {
    fn from(row: Row) -> Self {
        row.values
    }
}

/// A page of rows as returned by the table-data fetch API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub total_rows: Option<usize>,
    #[serde(default)]
    pub has_more: bool,
}

impl Page {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Page {
            total_rows: Some(rows.len()),
            columns,
            rows,
            has_more: false,
        }
    }

    /// Declared columns, or the columns seen across rows when none were declared.
    pub fn column_set(&self) -> Vec<String> {
        if !self.columns.is_empty() {
            return self.columns.clone();
        }
        let mut seen = Vec::new();
        for row in &self.rows {
            for column in row.columns() {
                if !seen.contains(column) {
                    seen.push(column.clone());
                }
            }
        }
        seen
    }
}
