use thiserror::Error;

use crate::registry::ChartType;

/// Rejections caused by user input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Unsupported file type '{extension}'; upload a CSV or Excel file")]
    UnsupportedFileType { extension: String },
    #[error("Unknown chart type '{name}'")]
    UnknownChartType { name: String },
    #[error("Chart '{chart}' requires a {axis} column")]
    MissingSelection { chart: ChartType, axis: &'static str },
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },
}

/// Why a chart payload could not be produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildCause {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("column '{column}' not found in dataset")]
    ColumnNotFound { column: String },
    #[error("column '{column}' contains non-numeric values")]
    NonNumeric { column: String },
    #[error("grouping column '{column}' has no values")]
    EmptyGroupingKey { column: String },
    #[error("dataset has no numeric column to size bubbles by")]
    NoNumericColumn,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Error creating {chart_type} chart: {cause}")]
pub struct ChartBuildError {
    pub chart_type: ChartType,
    #[source]
    pub cause: BuildCause,
}

impl ChartBuildError {
    pub fn new(chart_type: ChartType, cause: impl Into<BuildCause>) -> Self {
        Self {
            chart_type,
            cause: cause.into(),
        }
    }
}

/// Failures of the external text-completion service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("AI service is not configured: {0}")]
    NotConfigured(String),
    #[error("AI request timed out")]
    Timeout,
    #[error("AI request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("AI service returned status {status}")]
    Status { status: u16 },
    #[error("AI response was malformed: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout
        } else {
            ServiceError::Transport(err)
        }
    }
}
