use serde::Serialize;
use std::fmt;

use crate::data::{Cell, Column, StorageType};

/// The role a column plays for charting, derived from its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Numeric,
    Datetime,
    Categorical,
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SemanticType::Numeric => "numeric",
            SemanticType::Datetime => "datetime",
            SemanticType::Categorical => "categorical",
        })
    }
}

/// Classify a column. Date storage wins, then all-numeric contents;
/// everything else, including an all-missing column, is categorical.
pub fn classify(column: &Column) -> SemanticType {
    if column.dtype == StorageType::DateTime {
        return SemanticType::Datetime;
    }

    let mut present = column.cells.iter().filter(|c| !c.is_missing()).peekable();
    if present.peek().is_none() {
        return SemanticType::Categorical;
    }
    if present.all(|c| matches!(c, Cell::Number(_))) {
        SemanticType::Numeric
    } else {
        SemanticType::Categorical
    }
}
