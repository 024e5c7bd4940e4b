// Chart-ready output structures, serialized with the key names the
// frontend chart library expects.

use serde::Serialize;

use crate::options::ChartOptions;

/// Drawing primitive a payload is meant for. Several chart types reduce to
/// the same primitive (a histogram is drawn as bars, an area as a filled line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderKind {
    Bar,
    Line,
    Pie,
    Doughnut,
    Scatter,
    Bubble,
}

/// Ordered labels plus one or more series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartPayload {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartSeries>,
}

impl ChartPayload {
    pub fn new(labels: Vec<String>, datasets: Vec<ChartSeries>) -> Self {
        Self { labels, datasets }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub label: String,
    pub data: SeriesData,
    /// Per-label standard deviation, when the series summarizes groups.
    #[serde(rename = "stdDev", skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<Vec<f64>>,
    #[serde(flatten)]
    pub style: SeriesStyle,
}

impl ChartSeries {
    pub fn new(label: impl Into<String>, data: SeriesData, style: SeriesStyle) -> Self {
        Self {
            label: label.into(),
            data,
            std_dev: None,
            style,
        }
    }

    pub fn with_std_dev(mut self, std_dev: Vec<f64>) -> Self {
        self.std_dev = Some(std_dev);
        self
    }

    pub fn values(&self) -> &[f64] {
        match &self.data {
            SeriesData::Values(v) => v,
            SeriesData::Points(_) => &[],
        }
    }

    pub fn points(&self) -> &[Point] {
        match &self.data {
            SeriesData::Points(p) => p,
            SeriesData::Values(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesData {
    /// One value per label.
    Values(Vec<f64>),
    /// Free-standing points; labels are unused.
    Points(Vec<Point>),
}

/// A positioned point. `r` is a bubble radius, `v` a heatmap cell value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v: Option<f64>,
}

impl Point {
    pub fn xy(x: f64, y: f64) -> Self {
        Self { x, y, r: None, v: None }
    }
}

/// Fill for a whole series or one color per data point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Paint {
    Single(String),
    PerPoint(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Paint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_skipped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_radius: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_hover_radius: Option<u32>,
}

/// Everything the frontend needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub kind: RenderKind,
    pub data: ChartPayload,
    pub options: ChartOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_series_serializes_flat_camel_case() {
        let series = ChartSeries::new(
            "sales",
            SeriesData::Values(vec![1.0, 2.0]),
            SeriesStyle {
                background_color: Some(Paint::Single("red".into())),
                border_width: Some(2),
                point_hover_radius: Some(6),
                ..Default::default()
            },
        );
        let value = serde_json::to_value(&series).unwrap();
        assert_eq!(
            value,
            json!({
                "label": "sales",
                "data": [1.0, 2.0],
                "backgroundColor": "red",
                "borderWidth": 2,
                "pointHoverRadius": 6
            })
        );
    }

    #[test]
    fn test_std_dev_serialized_when_set() {
        let series = ChartSeries::new("avg", SeriesData::Values(vec![2.0]), SeriesStyle::default())
            .with_std_dev(vec![0.5]);
        let value = serde_json::to_value(&series).unwrap();
        assert_eq!(value["stdDev"], json!([0.5]));
    }

    #[test]
    fn test_point_omits_unset_fields() {
        let value = serde_json::to_value(Point::xy(1.0, 2.0)).unwrap();
        assert_eq!(value, json!({"x": 1.0, "y": 2.0}));
    }
}
