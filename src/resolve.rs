use serde::Serialize;

use crate::classify::classify;
use crate::data::Dataset;
use crate::registry::requirements;

/// Columns a chart type can bind per axis, plus the chart's display rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompatibleColumns {
    pub x_columns: Vec<String>,
    pub y_columns: Vec<String>,
    pub requires_y: bool,
    pub show_x: bool,
    pub show_y: bool,
    pub description: String,
    pub example: String,
}

/// Resolve which dataset columns are legal on each axis for `chart_type`.
///
/// Output preserves dataset column order, and a column may be listed for
/// both axes. Unknown chart types resolve to empty lists with y optional
/// and both axes shown.
pub fn resolve(dataset: &Dataset, chart_type: &str) -> CompatibleColumns {
    let spec = requirements(chart_type);

    let mut x_columns = Vec::new();
    let mut y_columns = Vec::new();
    for column in dataset.columns() {
        let ty = classify(column);
        if spec.allows_x(ty) {
            x_columns.push(column.name.clone());
        }
        if spec.allows_y(ty) {
            y_columns.push(column.name.clone());
        }
    }

    CompatibleColumns {
        x_columns,
        y_columns,
        requires_y: spec.requires_y,
        show_x: spec.show_x,
        show_y: spec.show_y,
        description: spec.description.to_string(),
        example: spec.example.to_string(),
    }
}
