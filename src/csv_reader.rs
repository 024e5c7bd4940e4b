use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::data::{Column, Dataset};
use crate::error::ValidationError;

/// Cell contents read as missing, in addition to the empty string.
const NA_TOKENS: &[&str] = &[
    "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A", "-NaN", "n/a", "<NA>",
];

/// Header and string cells read from a CSV file or a worksheet, before type inference.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Infer a storage type per column and build the dataset.
    pub fn into_dataset(self) -> Result<Dataset> {
        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(self.rows.len()); self.headers.len()];
        for row in self.rows {
            let mut cells = row.into_iter();
            for column in raw.iter_mut() {
                // short rows are padded with missing values
                column.push(cells.next().flatten());
            }
        }
        let columns = self
            .headers
            .into_iter()
            .zip(raw)
            .map(|(name, values)| Column::infer(name, values))
            .collect();
        Ok(Dataset::new(columns)?)
    }
}

fn is_missing(field: &str) -> bool {
    let field = field.trim();
    field.is_empty() || NA_TOKENS.contains(&field)
}

pub fn read_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV record {}", i + 1))?;
        rows.push(
            record
                .iter()
                .map(|f| (!is_missing(f)).then(|| f.to_string()))
                .collect(),
        );
    }

    Ok(RawTable { headers, rows })
}

/// Accepted upload formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    /// `.xlsx` or `.xls`; only the first worksheet is read.
    Spreadsheet,
}

/// Map a file name to its upload format; anything else is rejected.
pub fn check_extension(path: &Path) -> Result<SourceFormat, ValidationError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match extension.as_str() {
        "csv" => Ok(SourceFormat::Csv),
        "xlsx" | "xls" => Ok(SourceFormat::Spreadsheet),
        _ => Err(ValidationError::UnsupportedFileType { extension }),
    }
}

pub fn load_reader<R: Read>(reader: R) -> Result<Dataset> {
    read_csv(reader)?.into_dataset()
}

fn sheet_cell(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_datetime()?.format("%Y-%m-%d %H:%M:%S").to_string(),
    };
    (!is_missing(&text)).then_some(text)
}

/// Read the first worksheet of a workbook. The first row holds the headers.
pub fn read_spreadsheet(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Workbook {} has no worksheets", path.display()))?
        .context("Failed to read the first worksheet")?;

    let mut sheet_rows = range.rows();
    let headers = match sheet_rows.next() {
        Some(row) => row
            .iter()
            .enumerate()
            .map(|(i, cell)| sheet_cell(cell).unwrap_or_else(|| format!("Unnamed: {}", i)))
            .collect(),
        None => Vec::new(),
    };
    let rows = sheet_rows
        .map(|row| row.iter().map(sheet_cell).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

/// Load an uploaded CSV or spreadsheet file into a dataset.
pub fn load_path(path: &Path) -> Result<Dataset> {
    let raw = match check_extension(path)? {
        SourceFormat::Csv => {
            let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            read_csv(file)
        }
        SourceFormat::Spreadsheet => read_spreadsheet(path),
    };
    let dataset = raw
        .and_then(RawTable::into_dataset)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let (rows, cols) = dataset.shape();
    info!(path = %path.display(), rows, cols, "loaded dataset");
    Ok(dataset)
}
