// Rendering options derived from the chart type and selected columns.

use serde::Serialize;

use crate::registry::ChartType;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub responsive: bool,
    pub maintain_aspect_ratio: bool,
    pub plugins: Plugins,
    pub animation: Animation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scales: Option<Scales>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plugins {
    pub title: TitleOptions,
    pub legend: LegendOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<&'static str>,
}

impl Font {
    fn bold(size: u32) -> Self {
        Self { size, weight: Some("bold") }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleOptions {
    pub display: bool,
    pub text: String,
    pub font: Font,
    pub padding: u32,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendOptions {
    pub display: bool,
    pub position: &'static str,
    pub labels: LegendLabels,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendLabels {
    pub use_point_style: bool,
    pub padding: u32,
    pub font: Font,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Animation {
    pub duration: u32,
    pub easing: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scales {
    pub x: AxisOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<AxisOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisOptions {
    pub title: AxisTitle,
    pub grid: Grid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub begin_at_zero: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacked: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTitle {
    pub display: bool,
    pub text: String,
    pub font: Font,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    pub display: bool,
    pub color: &'static str,
}

impl AxisOptions {
    fn titled(text: &str) -> Self {
        Self {
            title: AxisTitle {
                display: true,
                text: text.to_string(),
                font: Font::bold(14),
            },
            grid: Grid {
                display: true,
                color: "rgba(0, 0, 0, 0.1)",
            },
            begin_at_zero: None,
            stacked: None,
        }
    }
}

/// `"Stacked Bar: region vs sales (Size: units)"`
pub fn chart_title(
    chart_type: ChartType,
    x_column: &str,
    y_column: Option<&str>,
    size_column: Option<&str>,
) -> String {
    let mut title = format!("{}: {}", chart_type.title(), x_column);
    if let Some(y) = y_column {
        title.push_str(&format!(" vs {}", y));
    }
    if let Some(size) = size_column {
        title.push_str(&format!(" (Size: {})", size));
    }
    title
}

/// Build rendering options. Pie and doughnut charts get no axes; the y axis
/// is configured only when a y column is selected.
pub fn options(
    chart_type: ChartType,
    x_column: &str,
    y_column: Option<&str>,
    size_column: Option<&str>,
) -> ChartOptions {
    let scales = match chart_type {
        ChartType::Pie | ChartType::Doughnut => None,
        _ => {
            let stacked = (chart_type == ChartType::StackedBar).then_some(true);

            let mut x = AxisOptions::titled(x_column);
            x.stacked = stacked;

            let y = y_column.map(|y_col| {
                let mut y = AxisOptions::titled(y_col);
                y.begin_at_zero = Some(matches!(chart_type, ChartType::Bar | ChartType::Area));
                y.stacked = stacked;
                y
            });
            Some(Scales { x, y })
        }
    };

    ChartOptions {
        responsive: true,
        maintain_aspect_ratio: false,
        plugins: Plugins {
            title: TitleOptions {
                display: true,
                text: chart_title(chart_type, x_column, y_column, size_column),
                font: Font::bold(16),
                padding: 20,
                color: "#2d3748",
            },
            legend: LegendOptions {
                display: true,
                position: "top",
                labels: LegendLabels {
                    use_point_style: true,
                    padding: 15,
                    font: Font { size: 12, weight: None },
                },
            },
        },
        animation: Animation {
            duration: 800,
            easing: "easeOutQuart",
        },
        scales,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_composition() {
        assert_eq!(chart_title(ChartType::Histogram, "age", None, None), "Histogram: age");
        assert_eq!(
            chart_title(ChartType::Bubble, "price", Some("quality"), Some("pop")),
            "Bubble: price vs quality (Size: pop)"
        );
        assert_eq!(
            chart_title(ChartType::StackedBar, "region", Some("sales"), None),
            "Stacked Bar: region vs sales"
        );
    }

    #[test]
    fn test_pie_has_no_scales() {
        let opts = options(ChartType::Pie, "region", Some("sales"), None);
        assert!(opts.scales.is_none());
    }

    #[test]
    fn test_bar_begins_at_zero() {
        let opts = options(ChartType::Bar, "region", Some("sales"), None);
        let scales = opts.scales.unwrap();
        assert_eq!(scales.x.title.text, "region");
        assert_eq!(scales.y.unwrap().begin_at_zero, Some(true));
        assert_eq!(scales.x.stacked, None);

        let opts = options(ChartType::Line, "date", Some("sales"), None);
        assert_eq!(opts.scales.unwrap().y.unwrap().begin_at_zero, Some(false));
    }

    #[test]
    fn test_y_axis_omitted_without_column() {
        let opts = options(ChartType::Histogram, "age", None, None);
        let scales = opts.scales.unwrap();
        assert!(scales.y.is_none());
    }

    #[test]
    fn test_stacked_bar_stacks_both_axes() {
        let opts = options(ChartType::StackedBar, "region", Some("sales"), None);
        let scales = opts.scales.unwrap();
        assert_eq!(scales.x.stacked, Some(true));
        assert_eq!(scales.y.unwrap().stacked, Some(true));
    }

    #[test]
    fn test_serialized_keys() {
        let value = serde_json::to_value(options(ChartType::Area, "t", Some("v"), None)).unwrap();
        assert_eq!(value["maintainAspectRatio"], false);
        assert_eq!(value["scales"]["y"]["beginAtZero"], true);
        assert_eq!(value["plugins"]["legend"]["labels"]["usePointStyle"], true);
        assert_eq!(value["animation"]["easing"], "easeOutQuart");
    }
}
