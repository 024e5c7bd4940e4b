use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

use crate::error::ValidationError;

/// Formats tried, in order, when deciding whether a text column holds dates.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Declared storage type of a column, fixed when the dataset is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Number,
    Text,
    DateTime,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pandas dtype names, since that is what users of the preview expect
        let name = match self {
            StorageType::Number => "float64",
            StorageType::Text => "object",
            StorageType::DateTime => "datetime64[ns]",
        };
        f.write_str(name)
    }
}

/// A single table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    DateTime(NaiveDateTime),
    Missing,
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    /// String form used for chart labels and table cells.
    pub fn label(&self) -> String {
        match self {
            Cell::Number(v) => v.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Cell::Missing => String::new(),
        }
    }

    /// Total order used for sorting and grouping.
    /// Numbers < datetimes < text, missing always last.
    pub fn total_cmp(&self, other: &Cell) -> Ordering {
        fn rank(c: &Cell) -> u8 {
            match c {
                Cell::Number(_) => 0,
                Cell::DateTime(_) => 1,
                Cell::Text(_) => 2,
                Cell::Missing => 3,
            }
        }
        match (self, other) {
            (Cell::Number(a), Cell::Number(b)) => a.total_cmp(b),
            (Cell::DateTime(a), Cell::DateTime(b)) => a.cmp(b),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

/// A named, typed column. All columns of a dataset have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub dtype: StorageType,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: StorageType, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            dtype,
            cells,
        }
    }

    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        let cells = values
            .into_iter()
            .map(|v| v.map(Cell::Number).unwrap_or(Cell::Missing))
            .collect();
        Self::new(name, StorageType::Number, cells)
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<&str>>) -> Self {
        let cells = values
            .into_iter()
            .map(|v| v.map(|s| Cell::Text(s.to_string())).unwrap_or(Cell::Missing))
            .collect();
        Self::new(name, StorageType::Text, cells)
    }

    /// Build a column from raw strings, inferring the storage type.
    /// `None` entries are missing values.
    pub fn infer(name: impl Into<String>, raw: Vec<Option<String>>) -> Self {
        let present: Vec<&str> = raw.iter().flatten().map(|s| s.trim()).collect();

        if !present.is_empty() && present.iter().all(|s| s.parse::<f64>().is_ok()) {
            let cells = raw
                .iter()
                .map(|v| match v {
                    Some(s) => s.trim().parse::<f64>().map(Cell::Number).unwrap_or(Cell::Missing),
                    None => Cell::Missing,
                })
                .collect();
            return Self::new(name, StorageType::Number, cells);
        }

        if !present.is_empty() && present.iter().all(|s| parse_datetime(s).is_some()) {
            let cells = raw
                .iter()
                .map(|v| {
                    v.as_deref()
                        .and_then(|s| parse_datetime(s.trim()))
                        .map(Cell::DateTime)
                        .unwrap_or(Cell::Missing)
                })
                .collect();
            return Self::new(name, StorageType::DateTime, cells);
        }

        let cells = raw
            .into_iter()
            .map(|v| v.map(Cell::Text).unwrap_or(Cell::Missing))
            .collect();
        Self::new(name, StorageType::Text, cells)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_missing()).count()
    }

    /// Non-missing numeric values, in row order.
    pub fn present_numbers(&self) -> Vec<f64> {
        self.cells.iter().filter_map(Cell::as_f64).collect()
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// An in-memory table of positionally aligned columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self, ValidationError> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(ValidationError::RaggedColumn {
                    column: bad.name.clone(),
                    expected,
                    found: bad.len(),
                });
            }
        }
        Ok(Self { columns })
    }

    /// Create a dataset from a JSON array of flat objects.
    /// Headers are taken from the first object.
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        let Some(first) = array.first() else {
            return Ok(Self::default());
        };
        let first_obj = first
            .as_object()
            .ok_or_else(|| anyhow!("Items in array must be objects"))?;
        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(array.len()); headers.len()];
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;
            for (i, header) in headers.iter().enumerate() {
                let val = match obj.get(header) {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(Value::Number(n)) => Some(n.to_string()),
                    Some(Value::Bool(b)) => Some(b.to_string()),
                    Some(Value::Null) | None => None,
                    _ => return Err(anyhow!("Unsupported value type for field '{}'", header)),
                };
                raw[i].push(val);
            }
        }

        let columns = headers
            .into_iter()
            .zip(raw)
            .map(|(name, values)| Column::infer(name, values))
            .collect();
        Ok(Self::new(columns)?)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.columns.len())
    }

    /// Columns stored as numbers, in dataset order.
    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| c.dtype == StorageType::Number)
            .collect()
    }

    /// Columns stored as text, in dataset order.
    pub fn categorical_columns(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| c.dtype == StorageType::Text)
            .collect()
    }

    /// Keep only the given rows, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Dataset {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                dtype: c.dtype,
                cells: rows.iter().map(|&r| c.cells[r].clone()).collect(),
            })
            .collect();
        Dataset { columns }
    }

    /// Metadata reported back to the client after an upload.
    pub fn info(&self, filename: &str) -> DatasetInfo {
        DatasetInfo {
            filename: filename.to_string(),
            columns: self.column_names(),
            data_types: self
                .columns
                .iter()
                .map(|c| (c.name.clone(), c.dtype.to_string()))
                .collect(),
            numeric_columns: self.numeric_columns().iter().map(|c| c.name.clone()).collect(),
            categorical_columns: self
                .categorical_columns()
                .iter()
                .map(|c| c.name.clone())
                .collect(),
            shape: self.shape(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetInfo {
    pub filename: String,
    pub columns: Vec<String>,
    pub data_types: Vec<(String, String)>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub shape: (usize, usize),
}
