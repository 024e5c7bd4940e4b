// Chart compatibility registry: which semantic types each chart type accepts per axis.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::classify::SemanticType::{self, Categorical, Datetime, Numeric};
use crate::error::ValidationError;

/// The closed set of supported chart types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Bar,
    Histogram,
    Pie,
    Doughnut,
    Line,
    Scatter,
    Box,
    StackedBar,
    Heatmap,
    Area,
    Bubble,
}

impl ChartType {
    pub const ALL: [ChartType; 11] = [
        ChartType::Bar,
        ChartType::Histogram,
        ChartType::Pie,
        ChartType::Doughnut,
        ChartType::Line,
        ChartType::Scatter,
        ChartType::Box,
        ChartType::StackedBar,
        ChartType::Heatmap,
        ChartType::Area,
        ChartType::Bubble,
    ];

    pub fn as_str(&self) -> &'static str {
        self.spec().name
    }

    /// Human form: underscores become spaces, words title-cased.
    pub fn title(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn spec(&self) -> &'static ChartTypeSpec {
        &CHART_SPECS[*self as usize]
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CHART_SPECS
            .iter()
            .zip(ChartType::ALL)
            .find(|(spec, _)| spec.name == s)
            .map(|(_, chart)| chart)
            .ok_or_else(|| ValidationError::UnknownChartType {
                name: s.to_string(),
            })
    }
}

/// Requirements of one chart type. Instances live in a static table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartTypeSpec {
    #[serde(skip)]
    pub name: &'static str,
    pub x_types: &'static [SemanticType],
    pub y_types: &'static [SemanticType],
    pub requires_y: bool,
    pub show_x: bool,
    pub show_y: bool,
    pub description: &'static str,
    pub example: &'static str,
}

impl ChartTypeSpec {
    /// Requirements returned for unrecognized identifiers: no allowed types, y optional, both axes shown.
    pub const EMPTY: ChartTypeSpec = ChartTypeSpec {
        name: "",
        x_types: &[],
        y_types: &[],
        requires_y: false,
        show_x: true,
        show_y: true,
        description: "",
        example: "",
    };

    pub fn allows_x(&self, ty: SemanticType) -> bool {
        self.x_types.contains(&ty)
    }

    pub fn allows_y(&self, ty: SemanticType) -> bool {
        self.y_types.contains(&ty)
    }
}

impl Default for ChartTypeSpec {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Indexed in the same order as `ChartType::ALL`.
static CHART_SPECS: [ChartTypeSpec; 11] = [
    ChartTypeSpec {
        name: "bar",
        x_types: &[Categorical],
        y_types: &[Numeric],
        requires_y: true,
        show_x: true,
        show_y: true,
        description: "1 categorical + 1 numerical",
        example: "Categories vs Sales Amount",
    },
    ChartTypeSpec {
        name: "histogram",
        x_types: &[Numeric],
        y_types: &[],
        requires_y: false,
        show_x: true,
        show_y: false,
        description: "1 numerical",
        example: "Age Distribution",
    },
    ChartTypeSpec {
        name: "pie",
        x_types: &[Categorical],
        y_types: &[Numeric],
        requires_y: true,
        show_x: false,
        show_y: false,
        description: "1 categorical + 1 numerical",
        example: "Market Share by Company",
    },
    ChartTypeSpec {
        name: "doughnut",
        x_types: &[Categorical],
        y_types: &[Numeric],
        requires_y: true,
        show_x: false,
        show_y: false,
        description: "1 categorical + 1 numerical",
        example: "Sales by Region",
    },
    ChartTypeSpec {
        name: "line",
        x_types: &[Datetime, Numeric],
        y_types: &[Numeric],
        requires_y: true,
        show_x: true,
        show_y: true,
        description: "1 time + 1 numerical (or more)",
        example: "Sales Trend Over Time",
    },
    ChartTypeSpec {
        name: "scatter",
        x_types: &[Numeric],
        y_types: &[Numeric],
        requires_y: true,
        show_x: true,
        show_y: true,
        description: "2 numerical (+ optional categorical)",
        example: "Height vs Weight",
    },
    ChartTypeSpec {
        name: "box",
        x_types: &[Numeric, Categorical],
        y_types: &[Numeric],
        requires_y: true,
        show_x: true,
        show_y: true,
        description: "1 numerical (+ optional categorical)",
        example: "Sales Distribution by Category",
    },
    ChartTypeSpec {
        name: "stacked_bar",
        x_types: &[Categorical],
        y_types: &[Numeric],
        requires_y: true,
        show_x: true,
        show_y: true,
        description: "2 categorical + 1 numerical",
        example: "Sales by Region and Product Type",
    },
    ChartTypeSpec {
        name: "heatmap",
        x_types: &[Categorical, Numeric],
        y_types: &[Categorical, Numeric],
        requires_y: true,
        show_x: true,
        show_y: true,
        description: "2 categorical + 1 numerical OR correlation matrix",
        example: "Sales by Month and Region",
    },
    ChartTypeSpec {
        name: "area",
        x_types: &[Datetime, Numeric],
        y_types: &[Numeric],
        requires_y: true,
        show_x: true,
        show_y: true,
        description: "1 time + 1+ numerical",
        example: "Revenue Growth Over Time",
    },
    ChartTypeSpec {
        name: "bubble",
        x_types: &[Numeric],
        y_types: &[Numeric],
        requires_y: true,
        show_x: true,
        show_y: true,
        description: "3 numerical (+ optional categorical)",
        example: "Price vs Quality vs Popularity",
    },
];

/// Look up a chart type by identifier. Unknown identifiers get `ChartTypeSpec::EMPTY`.
pub fn requirements(chart_type: &str) -> &'static ChartTypeSpec {
    chart_type
        .parse::<ChartType>()
        .map(|c| c.spec())
        .unwrap_or(&ChartTypeSpec::EMPTY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_matches_variants() {
        for chart in ChartType::ALL {
            let json = serde_json::to_value(chart).unwrap();
            assert_eq!(json.as_str().unwrap(), chart.spec().name);
        }
    }

    #[test]
    fn test_bar_requirements() {
        let spec = requirements("bar");
        assert!(spec.requires_y);
        assert_eq!(spec.x_types, &[Categorical]);
        assert_eq!(spec.y_types, &[Numeric]);
    }

    #[test]
    fn test_histogram_has_no_y() {
        let spec = requirements("histogram");
        assert!(!spec.requires_y);
        assert!(spec.y_types.is_empty());
        assert!(!spec.show_y);
    }

    #[test]
    fn test_unknown_chart_allows_nothing() {
        let spec = requirements("sankey");
        assert_eq!(spec, &ChartTypeSpec::EMPTY);
        assert!(!spec.requires_y);
        assert!(spec.show_x && spec.show_y);
    }

    #[test]
    fn test_parse_and_title() {
        let chart: ChartType = "stacked_bar".parse().unwrap();
        assert_eq!(chart, ChartType::StackedBar);
        assert_eq!(chart.title(), "Stacked Bar");
        assert!("Bar".parse::<ChartType>().is_err());
    }
}
