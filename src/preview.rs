// Tabular previews of a dataset: raw rows and per-column summary statistics.

use askama_escape::{escape, Html};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::Serialize;
use std::fmt::Write;
use std::str::FromStr;

use crate::data::{Cell, Dataset};
use crate::stat;
use crate::transform::SAMPLE_SEED;

const FULL_MAX_ROWS: usize = 100;
const HEAD_ROWS: usize = 10;
const SAMPLE_ROWS: usize = 10;
const TABLE_CLASSES: &str = "table table-striped table-hover";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    /// Up to the first 100 rows.
    Full,
    #[default]
    Head,
    Tail,
    /// Up to 10 rows drawn with a fixed seed.
    Sample,
}

impl FromStr for PreviewMode {
    type Err = std::convert::Infallible;

    /// Unknown names fall back to `head`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "full" => PreviewMode::Full,
            "tail" => PreviewMode::Tail,
            "sample" => PreviewMode::Sample,
            _ => PreviewMode::Head,
        })
    }
}

/// A rendered table: column headers, row labels, and string cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub index: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        let _ = write!(html, "<table class=\"{}\">\n  <thead>\n    <tr>\n      <th></th>\n", TABLE_CLASSES);
        for h in &self.headers {
            let _ = writeln!(html, "      <th>{}</th>", escape(h, Html));
        }
        html.push_str("    </tr>\n  </thead>\n  <tbody>\n");
        for (label, row) in self.index.iter().zip(&self.rows) {
            html.push_str("    <tr>\n");
            let _ = writeln!(html, "      <th>{}</th>", escape(label, Html));
            for cell in row {
                let _ = writeln!(html, "      <td>{}</td>", escape(cell, Html));
            }
            html.push_str("    </tr>\n");
        }
        html.push_str("  </tbody>\n</table>");
        html
    }
}

/// Result of [`statistics`]: a table, or the marker that nothing numeric exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "table", rename_all = "snake_case")]
pub enum StatisticsTable {
    Table(Table),
    NoNumericColumns,
}

impl StatisticsTable {
    pub fn to_html(&self) -> String {
        match self {
            StatisticsTable::Table(table) => table.to_html(),
            StatisticsTable::NoNumericColumns => {
                "<p class='text-muted'>No numeric columns found for statistical analysis.</p>".to_string()
            }
        }
    }
}

fn display_cell(cell: &Cell) -> String {
    match cell {
        Cell::Number(v) => stat::format_float(*v),
        Cell::Missing => "NaN".to_string(),
        other => other.label(),
    }
}

/// Rows to show for `mode`, by position in the dataset.
fn preview_rows(n: usize, mode: PreviewMode) -> Vec<usize> {
    match mode {
        PreviewMode::Full => (0..n.min(FULL_MAX_ROWS)).collect(),
        PreviewMode::Head => (0..n.min(HEAD_ROWS)).collect(),
        PreviewMode::Tail => (n.saturating_sub(HEAD_ROWS)..n).collect(),
        PreviewMode::Sample => {
            let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
            index::sample(&mut rng, n, n.min(SAMPLE_ROWS)).into_vec()
        }
    }
}

pub fn preview(dataset: &Dataset, mode: PreviewMode) -> Table {
    let rows = preview_rows(dataset.row_count(), mode);
    let subset = dataset.take_rows(&rows);

    Table {
        headers: dataset.column_names(),
        index: rows.iter().map(|r| r.to_string()).collect(),
        rows: (0..subset.row_count())
            .map(|r| subset.columns().iter().map(|c| display_cell(&c.cells[r])).collect())
            .collect(),
    }
}

const STAT_ROWS: [&str; 10] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max", "missing", "dtype"];

fn format_stat(v: Option<f64>) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{:.6}", v),
        _ => "NaN".to_string(),
    }
}

/// Summary statistics, one table column per number-typed dataset column.
pub fn statistics(dataset: &Dataset) -> StatisticsTable {
    let columns = dataset.numeric_columns();
    if columns.is_empty() {
        return StatisticsTable::NoNumericColumns;
    }

    // Each inner vec is one dataset column, in STAT_ROWS order.
    let per_column: Vec<Vec<String>> = columns
        .iter()
        .map(|column| {
            let values = stat::sorted(&column.present_numbers());
            let quantile = |p| (!values.is_empty()).then(|| stat::percentile(&values, p));
            vec![
                format_stat(Some(values.len() as f64)),
                format_stat(stat::mean(&values)),
                format_stat(stat::sample_std(&values)),
                format_stat(values.first().copied()),
                format_stat(quantile(0.25)),
                format_stat(quantile(0.50)),
                format_stat(quantile(0.75)),
                format_stat(values.last().copied()),
                column.missing_count().to_string(),
                column.dtype.to_string(),
            ]
        })
        .collect();

    let rows = (0..STAT_ROWS.len())
        .map(|stat_row| per_column.iter().map(|col| col[stat_row].clone()).collect())
        .collect();

    StatisticsTable::Table(Table {
        headers: columns.iter().map(|c| c.name.clone()).collect(),
        index: STAT_ROWS.iter().map(|s| s.to_string()).collect(),
        rows,
    })
}
