// Chart data transformer: turns a dataset and a column selection into
// chart-ready labels and series.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::classify::{classify, SemanticType};
use crate::data::{Cell, Column, Dataset, StorageType};
use crate::error::{BuildCause, ChartBuildError, ValidationError};
use crate::ir::{ChartConfig, ChartPayload, ChartSeries, Paint, Point, RenderKind, SeriesData, SeriesStyle};
use crate::options::options;
use crate::palette::{self, PRIMARY, SLICE_BORDER};
use crate::registry::ChartType;
use crate::stat;

/// Seed for every random sample, so identical input yields identical output.
pub const SAMPLE_SEED: u64 = 42;

const BAR_BINS: usize = 10;
const BAR_TOP_GROUPS: usize = 15;
const HISTOGRAM_BINS: usize = 20;
const SLICE_TOP_GROUPS: usize = 8;
const LINE_MAX_POINTS: usize = 500;
const AREA_MAX_POINTS: usize = 300;
const SCATTER_MAX_ROWS: usize = 1000;
const BUBBLE_MAX_ROWS: usize = 500;
const STACK_MAX_SERIES: usize = 6;
const STACK_FALLBACK_GROUPS: usize = 10;
const HEATMAP_MAX_SERIES: usize = 8;
const CORRELATION_MAX_COLUMNS: usize = 5;
const BUBBLE_MIN_RADIUS: f64 = 3.0;
const BUBBLE_MAX_RADIUS: f64 = 20.0;

/// A chart type plus the columns bound to it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChartRequest {
    pub chart_type: ChartType,
    pub x_column: String,
    #[serde(default)]
    pub y_column: Option<String>,
    #[serde(default)]
    pub size_column: Option<String>,
    #[serde(default)]
    pub stack_column: Option<String>,
}

impl ChartRequest {
    pub fn new(chart_type: ChartType, x_column: impl Into<String>) -> Self {
        Self {
            chart_type,
            x_column: x_column.into(),
            y_column: None,
            size_column: None,
            stack_column: None,
        }
    }

    pub fn with_y(mut self, y_column: impl Into<String>) -> Self {
        self.y_column = Some(y_column.into());
        self
    }

    pub fn with_size(mut self, size_column: impl Into<String>) -> Self {
        self.size_column = Some(size_column.into());
        self
    }

    pub fn with_stack(mut self, stack_column: impl Into<String>) -> Self {
        self.stack_column = Some(stack_column.into());
        self
    }
}

/// The two readings of a heatmap request, kept apart so one never leaks into the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatmapMode {
    /// Both axes numeric: correlation matrix of the leading numeric columns.
    Correlation,
    /// Otherwise: co-occurrence counts of x and y values.
    CoOccurrence,
}

impl HeatmapMode {
    pub fn detect(x: SemanticType, y: SemanticType) -> Self {
        if x == SemanticType::Numeric && y == SemanticType::Numeric {
            HeatmapMode::Correlation
        } else {
            HeatmapMode::CoOccurrence
        }
    }
}

/// Result of a transform before options are attached.
struct Built {
    kind: RenderKind,
    payload: ChartPayload,
    /// Size column actually used (bubble charts may pick a default).
    size_column: Option<String>,
}

impl Built {
    fn new(kind: RenderKind, labels: Vec<String>, datasets: Vec<ChartSeries>) -> Self {
        Self {
            kind,
            payload: ChartPayload::new(labels, datasets),
            size_column: None,
        }
    }
}

/// Build chart-ready data for `request`.
pub fn build(dataset: &Dataset, request: &ChartRequest) -> Result<ChartPayload, ChartBuildError> {
    build_inner(dataset, request).map(|b| b.payload)
}

/// Build the payload together with its drawing primitive and rendering options.
pub fn chart_config(dataset: &Dataset, request: &ChartRequest) -> Result<ChartConfig, ChartBuildError> {
    let built = build_inner(dataset, request)?;
    let options = options(
        request.chart_type,
        &request.x_column,
        request.y_column.as_deref(),
        built.size_column.as_deref().or(request.size_column.as_deref()),
    );
    Ok(ChartConfig {
        kind: built.kind,
        data: built.payload,
        options,
    })
}

fn build_inner(dataset: &Dataset, request: &ChartRequest) -> Result<Built, ChartBuildError> {
    let chart = request.chart_type;
    debug!(chart = %chart, x = %request.x_column, rows = dataset.row_count(), "building chart data");

    let ctx = Ctx::new(dataset, request).map_err(|cause| ChartBuildError::new(chart, cause))?;
    let built = match chart {
        ChartType::Bar => bar(&ctx),
        ChartType::Histogram => histogram(&ctx),
        ChartType::Pie => slices(&ctx, RenderKind::Pie),
        ChartType::Doughnut => slices(&ctx, RenderKind::Doughnut),
        ChartType::Line => trend(&ctx, LINE_MAX_POINTS, false),
        ChartType::Area => trend(&ctx, AREA_MAX_POINTS, true),
        ChartType::Scatter => scatter(&ctx),
        ChartType::Box => box_summary(&ctx),
        ChartType::StackedBar => stacked_bar(&ctx),
        ChartType::Heatmap => heatmap(&ctx),
        ChartType::Bubble => bubble(&ctx),
    };
    built.map_err(|cause| ChartBuildError::new(chart, cause))
}

/// Dataset and request, with every referenced column checked to exist.
struct Ctx<'a> {
    data: &'a Dataset,
    req: &'a ChartRequest,
    x: &'a Column,
}

impl<'a> Ctx<'a> {
    fn new(data: &'a Dataset, req: &'a ChartRequest) -> Result<Self, BuildCause> {
        let x = find_column(data, &req.x_column)?;
        for name in [&req.y_column, &req.size_column, &req.stack_column].into_iter().flatten() {
            find_column(data, name)?;
        }
        Ok(Self { data, req, x })
    }

    fn y(&self) -> Result<&'a Column, BuildCause> {
        let name = self.req.y_column.as_deref().ok_or(ValidationError::MissingSelection {
            chart: self.req.chart_type,
            axis: "y",
        })?;
        find_column(self.data, name)
    }

    fn x_name(&self) -> &str {
        &self.x.name
    }
}

fn find_column<'a>(data: &'a Dataset, name: &str) -> Result<&'a Column, BuildCause> {
    data.column(name).ok_or_else(|| BuildCause::ColumnNotFound {
        column: name.to_string(),
    })
}

/// Per-row numbers; missing cells become `None`, any other non-number is an error.
fn numbers(column: &Column) -> Result<Vec<Option<f64>>, BuildCause> {
    column
        .cells
        .iter()
        .map(|cell| match cell {
            Cell::Number(v) if v.is_nan() => Ok(None),
            Cell::Number(v) => Ok(Some(*v)),
            Cell::Missing => Ok(None),
            _ => Err(BuildCause::NonNumeric {
                column: column.name.clone(),
            }),
        })
        .collect()
}

/// Ordering wrapper so cells can key a `BTreeMap`.
#[derive(Debug, Clone)]
struct GroupKey(Cell);

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl GroupKey {
    /// `-0.0` and `0.0` compare equal, so both land in the `0.0` group.
    fn new(cell: &Cell) -> Self {
        match cell {
            Cell::Number(v) if *v == 0.0 => GroupKey(Cell::Number(0.0)),
            other => GroupKey(other.clone()),
        }
    }

    fn label(&self) -> String {
        self.0.label()
    }
}

/// Row indices grouped by key, in ascending key order. Missing keys are dropped.
fn group_rows(keys: &Column) -> Result<BTreeMap<GroupKey, Vec<usize>>, BuildCause> {
    let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
    for (row, cell) in keys.cells.iter().enumerate() {
        if !cell.is_missing() {
            groups.entry(GroupKey::new(cell)).or_default().push(row);
        }
    }
    if groups.is_empty() && !keys.is_empty() {
        return Err(BuildCause::EmptyGroupingKey {
            column: keys.name.clone(),
        });
    }
    Ok(groups)
}

fn present(values: &[Option<f64>], rows: &[usize]) -> Vec<f64> {
    rows.iter().filter_map(|&r| values[r]).collect()
}

/// Sort descending by value, keeping key order among ties, and keep the first `n`.
fn top_by_value(mut groups: Vec<(String, f64)>, n: usize) -> Vec<(String, f64)> {
    groups.sort_by(|a, b| b.1.total_cmp(&a.1));
    groups.truncate(n);
    groups
}

/// Keep every k-th item so that at most `cap` remain, preserving order.
fn stride_sample<T>(items: Vec<T>, cap: usize) -> Vec<T> {
    if items.len() <= cap {
        return items;
    }
    let step = items.len().div_ceil(cap);
    debug!(rows = items.len(), step, "down-sampling by stride");
    items.into_iter().step_by(step).collect()
}

/// Row indices to use: all rows, or a seeded sample without replacement.
fn sample_rows(n: usize, cap: usize) -> Vec<usize> {
    if n <= cap {
        return (0..n).collect();
    }
    debug!(rows = n, cap, seed = SAMPLE_SEED, "sampling rows");
    let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
    index::sample(&mut rng, n, cap).into_vec()
}

fn unzip_labels(groups: Vec<(String, f64)>) -> (Vec<String>, Vec<f64>) {
    groups.into_iter().unzip()
}

fn primary_style(border_width: u32) -> SeriesStyle {
    SeriesStyle {
        background_color: Some(Paint::Single(PRIMARY.into())),
        border_color: Some(PRIMARY.border().into()),
        border_width: Some(border_width),
        ..Default::default()
    }
}

fn fill_style(color: String, border_width: u32) -> SeriesStyle {
    SeriesStyle {
        background_color: Some(Paint::Single(color)),
        border_width: Some(border_width),
        ..Default::default()
    }
}

// =============================================================================
// Per chart type handlers
// =============================================================================

fn bar(ctx: &Ctx) -> Result<Built, BuildCause> {
    let y = ctx.y()?;
    let ys = numbers(y)?;

    let (labels, values): (Vec<String>, Vec<f64>) = if classify(ctx.x) == SemanticType::Numeric {
        let xs = numbers(ctx.x)?;
        let present_x: Vec<f64> = xs.iter().flatten().copied().collect();
        let edges = stat::cut_edges(&present_x, BAR_BINS);
        let bin_labels = stat::interval_labels(&edges);

        let mut per_bin: Vec<Vec<f64>> = vec![Vec::new(); bin_labels.len()];
        for (x, y) in xs.iter().zip(&ys) {
            if let (Some(x), Some(y)) = (x, y) {
                if let Some(bin) = stat::bin_index(&edges, *x) {
                    per_bin[bin].push(*y);
                }
            }
        }
        // Empty bins carry no mean and are dropped.
        bin_labels
            .into_iter()
            .zip(per_bin)
            .filter_map(|(label, vals)| stat::mean(&vals).map(|m| (label, m)))
            .unzip()
    } else {
        let groups = group_rows(ctx.x)?;
        let means: Vec<(String, f64)> = groups
            .iter()
            .filter_map(|(key, rows)| stat::mean(&present(&ys, rows)).map(|m| (key.label(), m)))
            .collect();
        unzip_labels(top_by_value(means, BAR_TOP_GROUPS))
    };

    let style = SeriesStyle {
        border_radius: Some(4),
        border_skipped: Some(false),
        ..primary_style(2)
    };
    let series = ChartSeries::new(
        format!("{} by {}", y.name, ctx.x_name()),
        SeriesData::Values(values),
        style,
    );
    Ok(Built::new(RenderKind::Bar, labels, vec![series]))
}

fn histogram(ctx: &Ctx) -> Result<Built, BuildCause> {
    let values: Vec<f64> = numbers(ctx.x)?.into_iter().flatten().collect();
    let (edges, counts) = stat::histogram(&values, HISTOGRAM_BINS);

    let labels = edges[..HISTOGRAM_BINS].iter().map(|e| format!("{:.2}", e)).collect();
    let series = ChartSeries::new(
        format!("Distribution of {}", ctx.x_name()),
        SeriesData::Values(counts.into_iter().map(|c| c as f64).collect()),
        primary_style(1),
    );
    Ok(Built::new(RenderKind::Bar, labels, vec![series]))
}

fn slices(ctx: &Ctx, kind: RenderKind) -> Result<Built, BuildCause> {
    let ys = numbers(ctx.y()?)?;
    let groups = group_rows(ctx.x)?;
    let sums: Vec<(String, f64)> = groups
        .iter()
        .map(|(key, rows)| (key.label(), present(&ys, rows).iter().sum()))
        .collect();
    let (labels, values) = unzip_labels(top_by_value(sums, SLICE_TOP_GROUPS));

    let style = SeriesStyle {
        background_color: Some(Paint::PerPoint(palette::slice_colors(labels.len()))),
        border_color: Some(SLICE_BORDER.into()),
        border_width: Some(2),
        ..Default::default()
    };
    let series = ChartSeries::new(ctx.x_name(), SeriesData::Values(values), style);
    Ok(Built::new(kind, labels, vec![series]))
}

/// Line and area: rows sorted by x, then stride-sampled to at most `cap` points.
fn trend(ctx: &Ctx, cap: usize, fill: bool) -> Result<Built, BuildCause> {
    let y = ctx.y()?;
    let ys = numbers(y)?;

    let mut rows: Vec<(&Cell, f64)> = ctx
        .x
        .cells
        .iter()
        .zip(&ys)
        .filter_map(|(x, y)| match (x.is_missing(), y) {
            (false, Some(y)) => Some((x, *y)),
            _ => None,
        })
        .collect();
    rows.sort_by(|a, b| a.0.total_cmp(b.0));
    let rows = stride_sample(rows, cap);

    let (labels, values): (Vec<String>, Vec<f64>) = rows.into_iter().map(|(x, y)| (x.label(), y)).unzip();

    let style = if fill {
        SeriesStyle {
            border_color: Some(PRIMARY.border().into()),
            background_color: Some(Paint::Single(PRIMARY.with_alpha(0.3).into())),
            fill: Some(true),
            tension: Some(0.4),
            border_width: Some(2),
            ..Default::default()
        }
    } else {
        SeriesStyle {
            border_color: Some(PRIMARY.border().into()),
            background_color: Some(Paint::Single(PRIMARY.with_alpha(0.1).into())),
            fill: Some(false),
            tension: Some(0.4),
            point_radius: Some(2),
            point_hover_radius: Some(6),
            border_width: Some(3),
            ..Default::default()
        }
    };
    let series = ChartSeries::new(y.name.clone(), SeriesData::Values(values), style);
    Ok(Built::new(RenderKind::Line, labels, vec![series]))
}

fn scatter(ctx: &Ctx) -> Result<Built, BuildCause> {
    let y = ctx.y()?;
    let xs = numbers(ctx.x)?;
    let ys = numbers(y)?;

    let points = sample_rows(ctx.data.row_count(), SCATTER_MAX_ROWS)
        .into_iter()
        .filter_map(|r| Some(Point::xy(xs[r]?, ys[r]?)))
        .collect();

    let style = SeriesStyle {
        background_color: Some(Paint::Single(PRIMARY.into())),
        border_color: Some(PRIMARY.border().into()),
        point_radius: Some(4),
        point_hover_radius: Some(8),
        ..Default::default()
    };
    let series = ChartSeries::new(
        format!("{} vs {}", ctx.x_name(), y.name),
        SeriesData::Points(points),
        style,
    );
    Ok(Built::new(RenderKind::Scatter, Vec::new(), vec![series]))
}

/// Numeric x: five summary values as bars. Categorical x: mean of y per group,
/// with the per-group standard deviation carried alongside.
fn box_summary(ctx: &Ctx) -> Result<Built, BuildCause> {
    // A number-typed column with nothing in it still takes the summary path.
    let numeric_x = classify(ctx.x) == SemanticType::Numeric
        || (ctx.x.dtype == StorageType::Number && ctx.x.present_numbers().is_empty());
    if numeric_x {
        let values = stat::sorted(&ctx.x.present_numbers());
        if values.is_empty() {
            return Ok(Built::new(RenderKind::Bar, Vec::new(), Vec::new()));
        }
        let summary = vec![
            stat::percentile(&values, 0.25),
            stat::percentile(&values, 0.50),
            stat::percentile(&values, 0.75),
            values[0],
            values[values.len() - 1],
        ];
        let labels = ["Q1", "Median", "Q3", "Min", "Max"].map(String::from).to_vec();
        let style = SeriesStyle {
            background_color: Some(Paint::PerPoint(palette::slice_colors(5))),
            border_width: Some(1),
            ..Default::default()
        };
        let series = ChartSeries::new(
            format!("{} Statistics", ctx.x_name()),
            SeriesData::Values(summary),
            style,
        );
        return Ok(Built::new(RenderKind::Bar, labels, vec![series]));
    }

    let y = ctx.y()?;
    let ys = numbers(y)?;
    let groups = group_rows(ctx.x)?;
    let mut labels = Vec::with_capacity(groups.len());
    let mut means = Vec::with_capacity(groups.len());
    let mut spreads = Vec::with_capacity(groups.len());
    for (key, rows) in &groups {
        let values = present(&ys, rows);
        labels.push(key.label());
        means.push(stat::mean(&values).unwrap_or(0.0));
        spreads.push(stat::sample_std(&values).unwrap_or(0.0));
    }

    let series = ChartSeries::new(
        format!("Average {}", y.name),
        SeriesData::Values(means),
        fill_style(PRIMARY.into(), 1),
    )
    .with_std_dev(spreads);
    Ok(Built::new(RenderKind::Bar, labels, vec![series]))
}

/// Long-to-wide reshape: one row per x key, one column per series key.
/// Keys are sorted; absent combinations are zero.
struct Pivot {
    index: Vec<GroupKey>,
    columns: Vec<GroupKey>,
    cells: BTreeMap<(GroupKey, GroupKey), f64>,
}

impl Pivot {
    fn build(
        index: &Column,
        columns: &Column,
        mut value_of: impl FnMut(usize) -> f64,
    ) -> Result<Self, BuildCause> {
        group_rows(index)?;
        group_rows(columns)?;

        let mut cells = BTreeMap::new();
        let mut index_keys = BTreeSet::new();
        let mut column_keys = BTreeSet::new();
        for (row, (i, c)) in index.cells.iter().zip(&columns.cells).enumerate() {
            if i.is_missing() || c.is_missing() {
                continue;
            }
            let (i, c) = (GroupKey::new(i), GroupKey::new(c));
            index_keys.insert(i.clone());
            column_keys.insert(c.clone());
            *cells.entry((i, c)).or_insert(0.0) += value_of(row);
        }

        Ok(Self {
            index: index_keys.into_iter().collect(),
            columns: column_keys.into_iter().collect(),
            cells,
        })
    }

    fn labels(&self) -> Vec<String> {
        self.index.iter().map(GroupKey::label).collect()
    }

    /// One series per column key, up to `max`, aligned to the index order.
    fn series(&self, max: usize, border_width: Option<u32>) -> Vec<ChartSeries> {
        self.columns
            .iter()
            .take(max)
            .enumerate()
            .map(|(i, col)| {
                let data = self
                    .index
                    .iter()
                    .map(|idx| {
                        self.cells
                            .get(&(idx.clone(), col.clone()))
                            .copied()
                            .unwrap_or(0.0)
                    })
                    .collect();
                let style = SeriesStyle {
                    background_color: Some(Paint::Single(palette::series_color(i).into())),
                    border_width,
                    ..Default::default()
                };
                ChartSeries::new(col.label(), SeriesData::Values(data), style)
            })
            .collect()
    }
}

fn stacked_bar(ctx: &Ctx) -> Result<Built, BuildCause> {
    let y = ctx.y()?;
    let ys = numbers(y)?;

    if let Some(stack_name) = &ctx.req.stack_column {
        let stack = find_column(ctx.data, stack_name)?;
        let pivot = Pivot::build(ctx.x, stack, |row| ys[row].unwrap_or(0.0))?;
        return Ok(Built::new(
            RenderKind::Bar,
            pivot.labels(),
            pivot.series(STACK_MAX_SERIES, Some(1)),
        ));
    }

    // Without a stack column: plain sums per x, first groups in key order.
    let groups = group_rows(ctx.x)?;
    let (labels, sums): (Vec<String>, Vec<f64>) = groups
        .iter()
        .take(STACK_FALLBACK_GROUPS)
        .map(|(key, rows)| (key.label(), present(&ys, rows).iter().sum::<f64>()))
        .unzip();
    let series = ChartSeries::new(
        y.name.clone(),
        SeriesData::Values(sums),
        SeriesStyle {
            background_color: Some(Paint::Single(PRIMARY.into())),
            ..Default::default()
        },
    );
    Ok(Built::new(RenderKind::Bar, labels, vec![series]))
}

fn heatmap(ctx: &Ctx) -> Result<Built, BuildCause> {
    let y = ctx.y()?;
    match HeatmapMode::detect(classify(ctx.x), classify(y)) {
        HeatmapMode::Correlation => correlation_heatmap(ctx),
        HeatmapMode::CoOccurrence => co_occurrence_heatmap(ctx, y),
    }
}

fn correlation_heatmap(ctx: &Ctx) -> Result<Built, BuildCause> {
    let columns: Vec<&Column> = ctx
        .data
        .columns()
        .iter()
        .filter(|c| classify(c) == SemanticType::Numeric)
        .take(CORRELATION_MAX_COLUMNS)
        .collect();
    let values = columns
        .iter()
        .map(|c| numbers(c))
        .collect::<Result<Vec<_>, _>>()?;

    let mut points = Vec::with_capacity(columns.len() * columns.len());
    let mut colors = Vec::with_capacity(points.capacity());
    for i in 0..columns.len() {
        for j in 0..columns.len() {
            let corr = stat::pearson(&values[j], &values[i]);
            points.push(Point {
                x: i as f64,
                y: j as f64,
                r: None,
                v: Some(corr),
            });
            colors.push(palette::correlation_color(corr).to_string());
        }
    }

    let labels = columns.iter().map(|c| c.name.clone()).collect();
    let style = SeriesStyle {
        background_color: Some(Paint::PerPoint(colors)),
        point_radius: Some(15),
        ..Default::default()
    };
    let series = ChartSeries::new("Correlation", SeriesData::Points(points), style);
    Ok(Built::new(RenderKind::Scatter, labels, vec![series]))
}

fn co_occurrence_heatmap(ctx: &Ctx, y: &Column) -> Result<Built, BuildCause> {
    let pivot = Pivot::build(ctx.x, y, |_| 1.0)?;
    Ok(Built::new(
        RenderKind::Bar,
        pivot.labels(),
        pivot.series(HEATMAP_MAX_SERIES, None),
    ))
}

fn bubble(ctx: &Ctx) -> Result<Built, BuildCause> {
    let y = ctx.y()?;
    let size = match &ctx.req.size_column {
        Some(name) => find_column(ctx.data, name)?,
        None => ctx
            .data
            .columns()
            .iter()
            .find(|c| classify(c) == SemanticType::Numeric)
            .ok_or(BuildCause::NoNumericColumn)?,
    };

    let xs = numbers(ctx.x)?;
    let ys = numbers(y)?;
    let sizes = numbers(size)?;
    let spread = stat::sample_std(&size.present_numbers()).unwrap_or(f64::NAN);

    let points = sample_rows(ctx.data.row_count(), BUBBLE_MAX_ROWS)
        .into_iter()
        .filter_map(|r| {
            let (x, y, s) = (xs[r]?, ys[r]?, sizes[r]?);
            Some(Point {
                x,
                y,
                r: Some(bubble_radius(s, spread)),
                v: None,
            })
        })
        .collect();

    let series = ChartSeries::new(
        format!("{} vs {} (Size: {})", ctx.x_name(), y.name, size.name),
        SeriesData::Points(points),
        primary_style(1),
    );
    let mut built = Built::new(RenderKind::Bubble, Vec::new(), vec![series]);
    built.size_column = Some(size.name.clone());
    Ok(built)
}

/// `|value| / spread * 5`, clamped to the radius range. An undefined ratio
/// (zero or missing spread) gets the largest radius.
fn bubble_radius(value: f64, spread: f64) -> f64 {
    let r = value.abs() / spread * 5.0;
    if r.is_nan() {
        BUBBLE_MAX_RADIUS
    } else {
        r.clamp(BUBBLE_MIN_RADIUS, BUBBLE_MAX_RADIUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_data() -> Dataset {
        Dataset::new(vec![
            Column::text("region", vec![Some("A"), Some("A"), Some("B")]),
            Column::numeric("sales", vec![Some(10.0), Some(20.0), Some(30.0)]),
        ])
        .unwrap()
    }

    fn make_wide() -> Dataset {
        Dataset::new(vec![
            Column::text("region", vec![Some("N"), Some("S"), Some("N"), Some("S"), None]),
            Column::text("product", vec![Some("x"), Some("x"), Some("y"), Some("z"), Some("x")]),
            Column::numeric("sales", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)]),
            Column::numeric("cost", vec![Some(2.0), Some(4.0), Some(6.0), Some(8.0), Some(10.0)]),
            Column::numeric("noise", vec![Some(5.0), Some(1.0), Some(4.0), Some(2.0), Some(3.0)]),
        ])
        .unwrap()
    }

    fn numeric_rows(n: usize) -> Dataset {
        Dataset::new(vec![
            Column::numeric("x", (0..n).map(|i| Some(i as f64)).collect()),
            Column::numeric("y", (0..n).map(|i| Some((i * 2) as f64)).collect()),
            Column::numeric("s", (0..n).map(|i| Some((i % 7) as f64 - 3.0)).collect()),
        ])
        .unwrap()
    }

    #[test]
    fn test_bar_sorted_by_mean() {
        let req = ChartRequest::new(ChartType::Bar, "region").with_y("sales");
        let payload = build(&make_data(), &req).unwrap();
        assert_eq!(payload.labels, vec!["B", "A"]);
        assert_eq!(payload.datasets[0].values(), &[30.0, 15.0]);
        assert_eq!(payload.datasets[0].label, "sales by region");
    }

    #[test]
    fn test_bar_numeric_x_is_binned() {
        let data = numeric_rows(100);
        let req = ChartRequest::new(ChartType::Bar, "x").with_y("y");
        let payload = build(&data, &req).unwrap();
        assert_eq!(payload.labels.len(), 10);
        assert!(payload.labels[0].starts_with('('));
        assert!(payload.labels[9].ends_with(']'));
    }

    #[test]
    fn test_bar_requires_y() {
        let req = ChartRequest::new(ChartType::Bar, "region");
        let err = build(&make_data(), &req).unwrap_err();
        assert_eq!(err.chart_type, ChartType::Bar);
        assert!(matches!(
            err.cause,
            BuildCause::Validation(ValidationError::MissingSelection { axis: "y", .. })
        ));
    }

    #[test]
    fn test_missing_column_is_error() {
        let req = ChartRequest::new(ChartType::Pie, "region").with_y("profit");
        let err = build(&make_data(), &req).unwrap_err();
        assert_eq!(
            err.cause,
            BuildCause::ColumnNotFound {
                column: "profit".to_string()
            }
        );
    }

    #[test]
    fn test_non_numeric_measure_is_error() {
        let req = ChartRequest::new(ChartType::Bar, "sales").with_y("region");
        let err = build(&make_data(), &req).unwrap_err();
        assert!(matches!(err.cause, BuildCause::NonNumeric { .. }));
    }

    #[test]
    fn test_histogram_has_twenty_bins() {
        let mut values: Vec<Option<f64>> = (0..57).map(|i| Some(i as f64 * 1.5)).collect();
        values.push(None);
        let data = Dataset::new(vec![Column::numeric("age", values)]).unwrap();
        let payload = build(&data, &ChartRequest::new(ChartType::Histogram, "age")).unwrap();
        assert_eq!(payload.labels.len(), 20);
        assert_eq!(payload.labels[0], "0.00");
        let counts = payload.datasets[0].values();
        assert_eq!(counts.len(), 20);
        assert_eq!(counts.iter().sum::<f64>(), 57.0);
    }

    #[test]
    fn test_pie_top_eight_descending() {
        let names: Vec<String> = (0..12).map(|i| format!("c{:02}", i)).collect();
        let data = Dataset::new(vec![
            Column::text("cat", names.iter().map(|s| Some(s.as_str())).collect()),
            Column::numeric("v", (0..12).map(|i| Some(i as f64)).collect()),
        ])
        .unwrap();
        let req = ChartRequest::new(ChartType::Pie, "cat").with_y("v");
        let payload = build(&data, &req).unwrap();
        assert_eq!(payload.labels.len(), 8);
        assert_eq!(payload.labels[0], "c11");
        let values = payload.datasets[0].values();
        assert!(values.windows(2).all(|w| w[0] >= w[1]));
        match &payload.datasets[0].style.background_color {
            Some(Paint::PerPoint(colors)) => assert_eq!(colors.len(), 8),
            other => panic!("expected per-slice colors, got {:?}", other),
        }
    }

    #[test]
    fn test_line_sorted_and_capped() {
        let n = 1234;
        let data = Dataset::new(vec![
            Column::numeric("t", (0..n).rev().map(|i| Some(i as f64)).collect()),
            Column::numeric("v", (0..n).map(|i| Some(i as f64)).collect()),
        ])
        .unwrap();
        let line = build(&data, &ChartRequest::new(ChartType::Line, "t").with_y("v")).unwrap();
        assert!(line.labels.len() <= 500);
        let xs: Vec<f64> = line.labels.iter().map(|l| l.parse().unwrap()).collect();
        assert!(xs.windows(2).all(|w| w[0] <= w[1]));

        let area = build(&data, &ChartRequest::new(ChartType::Area, "t").with_y("v")).unwrap();
        assert!(area.labels.len() <= 300);
        assert_eq!(area.datasets[0].style.fill, Some(true));
    }

    #[test]
    fn test_line_drops_missing_rows() {
        let data = Dataset::new(vec![
            Column::numeric("t", vec![Some(3.0), None, Some(1.0)]),
            Column::numeric("v", vec![Some(30.0), Some(20.0), None]),
        ])
        .unwrap();
        let payload = build(&data, &ChartRequest::new(ChartType::Line, "t").with_y("v")).unwrap();
        assert_eq!(payload.labels, vec!["3"]);
        assert_eq!(payload.datasets[0].values(), &[30.0]);
    }

    #[test]
    fn test_scatter_sampling_is_deterministic() {
        let data = numeric_rows(2500);
        let req = ChartRequest::new(ChartType::Scatter, "x").with_y("y");
        let a = build(&data, &req).unwrap();
        let b = build(&data, &req).unwrap();
        assert_eq!(a.datasets[0].points().len(), 1000);
        assert_eq!(a, b);
        assert!(a.labels.is_empty());
    }

    #[test]
    fn test_bubble_sampling_is_deterministic() {
        let data = numeric_rows(1200);
        let req = ChartRequest::new(ChartType::Bubble, "x").with_y("y").with_size("s");
        let a = build(&data, &req).unwrap();
        let b = build(&data, &req).unwrap();
        assert_eq!(a.datasets[0].points().len(), 500);
        assert_eq!(a.datasets[0].points(), b.datasets[0].points());
    }

    #[test]
    fn test_signed_zero_keys_share_a_group() {
        let data = Dataset::new(vec![
            Column::numeric("k", vec![Some(0.0), Some(-0.0)]),
            Column::numeric("v", vec![Some(1.0), Some(3.0)]),
        ])
        .unwrap();
        let payload = build(&data, &ChartRequest::new(ChartType::Pie, "k").with_y("v")).unwrap();
        assert_eq!(payload.labels, vec!["0"]);
        assert_eq!(payload.datasets[0].values(), &[4.0]);
    }

    #[test]
    fn test_line_stride_keeps_under_cap() {
        let data = numeric_rows(999);
        let payload = build(&data, &ChartRequest::new(ChartType::Line, "x").with_y("y")).unwrap();
        assert_eq!(payload.labels.len(), 500);
        assert_eq!(payload.labels[1], "2");
    }

    #[test]
    fn test_box_numeric_summary() {
        let data = Dataset::new(vec![Column::numeric(
            "v",
            vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), None],
        )])
        .unwrap();
        let payload = build(&data, &ChartRequest::new(ChartType::Box, "v")).unwrap();
        assert_eq!(payload.labels, vec!["Q1", "Median", "Q3", "Min", "Max"]);
        assert_eq!(payload.datasets[0].values(), &[1.75, 2.5, 3.25, 1.0, 4.0]);
    }

    #[test]
    fn test_box_numeric_without_values_is_empty() {
        let data = Dataset::new(vec![Column::numeric("v", vec![None, None])]).unwrap();
        let payload = build(&data, &ChartRequest::new(ChartType::Box, "v")).unwrap();
        assert_eq!(payload, ChartPayload::default());
    }

    #[test]
    fn test_box_categorical_means_in_key_order() {
        let req = ChartRequest::new(ChartType::Box, "region").with_y("sales");
        let payload = build(&make_data(), &req).unwrap();
        assert_eq!(payload.labels, vec!["A", "B"]);
        assert_eq!(payload.datasets[0].values(), &[15.0, 30.0]);
        assert_eq!(payload.datasets[0].label, "Average sales");
        // A has 10 and 20; B has a single value, so no spread
        let spreads = payload.datasets[0].std_dev.as_deref().unwrap();
        assert!((spreads[0] - 7.0710678).abs() < 1e-6);
        assert_eq!(spreads[1], 0.0);
    }

    #[test]
    fn test_stacked_bar_pivot() {
        let req = ChartRequest::new(ChartType::StackedBar, "region")
            .with_y("sales")
            .with_stack("product");
        let payload = build(&make_wide(), &req).unwrap();
        assert_eq!(payload.labels, vec!["N", "S"]);
        let labels: Vec<&str> = payload.datasets.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["x", "y", "z"]);
        assert_eq!(payload.datasets[0].values(), &[1.0, 2.0]);
        assert_eq!(payload.datasets[1].values(), &[3.0, 0.0]);
        assert_eq!(payload.datasets[2].values(), &[0.0, 4.0]);
    }

    #[test]
    fn test_stacked_bar_without_stack_sums_in_key_order() {
        let req = ChartRequest::new(ChartType::StackedBar, "region").with_y("sales");
        let payload = build(&make_wide(), &req).unwrap();
        assert_eq!(payload.labels, vec!["N", "S"]);
        assert_eq!(payload.datasets.len(), 1);
        assert_eq!(payload.datasets[0].values(), &[4.0, 6.0]);
    }

    #[test]
    fn test_heatmap_correlation_mode() {
        let req = ChartRequest::new(ChartType::Heatmap, "sales").with_y("cost");
        let payload = build(&make_wide(), &req).unwrap();
        assert_eq!(payload.labels, vec!["sales", "cost", "noise"]);
        let points = payload.datasets[0].points();
        assert_eq!(points.len(), 9);
        // sales and cost are perfectly correlated
        assert!((points[1].v.unwrap() - 1.0).abs() < 1e-9);
        match &payload.datasets[0].style.background_color {
            Some(Paint::PerPoint(colors)) => assert_eq!(colors[1], "rgba(255, 0, 0, 0.8)"),
            other => panic!("expected per-cell colors, got {:?}", other),
        }
    }

    #[test]
    fn test_heatmap_co_occurrence_mode() {
        let req = ChartRequest::new(ChartType::Heatmap, "region").with_y("product");
        let config = chart_config(&make_wide(), &req).unwrap();
        assert_eq!(config.kind, RenderKind::Bar);
        assert_eq!(config.data.labels, vec!["N", "S"]);
        assert_eq!(config.data.datasets.len(), 3);
        assert_eq!(config.data.datasets[0].values(), &[1.0, 1.0]);
    }

    #[test]
    fn test_heatmap_mode_detection() {
        use SemanticType::*;
        assert_eq!(HeatmapMode::detect(Numeric, Numeric), HeatmapMode::Correlation);
        assert_eq!(HeatmapMode::detect(Numeric, Categorical), HeatmapMode::CoOccurrence);
        assert_eq!(HeatmapMode::detect(Datetime, Numeric), HeatmapMode::CoOccurrence);
    }

    #[test]
    fn test_bubble_defaults_size_and_clamps() {
        let data = numeric_rows(900);
        let req = ChartRequest::new(ChartType::Bubble, "x").with_y("y");
        let config = chart_config(&data, &req).unwrap();
        assert_eq!(config.kind, RenderKind::Bubble);
        let points = config.data.datasets[0].points();
        assert_eq!(points.len(), 500);
        assert!(points.iter().all(|p| (3.0..=20.0).contains(&p.r.unwrap())));
        assert_eq!(config.data.datasets[0].label, "x vs y (Size: x)");
        assert_eq!(config.options.plugins.title.text, "Bubble: x vs y (Size: x)");
    }

    #[test]
    fn test_empty_grouping_key_is_error() {
        let data = Dataset::new(vec![
            Column::text("cat", vec![None, None]),
            Column::numeric("v", vec![Some(1.0), Some(2.0)]),
        ])
        .unwrap();
        let err = build(&data, &ChartRequest::new(ChartType::Pie, "cat").with_y("v")).unwrap_err();
        assert!(matches!(err.cause, BuildCause::EmptyGroupingKey { .. }));
    }

    #[test]
    fn test_empty_dataset_gives_empty_payload() {
        let data = Dataset::new(vec![
            Column::text("cat", vec![]),
            Column::numeric("v", vec![]),
        ])
        .unwrap();
        for chart in [ChartType::Bar, ChartType::Pie, ChartType::Line, ChartType::StackedBar] {
            let payload = build(&data, &ChartRequest::new(chart, "cat").with_y("v")).unwrap();
            assert!(payload.labels.is_empty(), "{} produced labels", chart);
        }
    }

    #[test]
    fn test_chart_config_render_kinds() {
        let data = make_wide();
        let cases = [
            (ChartRequest::new(ChartType::Histogram, "sales"), RenderKind::Bar),
            (ChartRequest::new(ChartType::Area, "sales").with_y("cost"), RenderKind::Line),
            (ChartRequest::new(ChartType::Doughnut, "region").with_y("cost"), RenderKind::Doughnut),
            (ChartRequest::new(ChartType::Box, "sales"), RenderKind::Bar),
        ];
        for (req, kind) in cases {
            assert_eq!(chart_config(&data, &req).unwrap().kind, kind);
        }
    }

    proptest! {
        #[test]
        fn prop_bubble_radius_in_range(value in -1e9f64..1e9, spread in 0.0f64..1e6) {
            let r = bubble_radius(value, spread);
            prop_assert!((BUBBLE_MIN_RADIUS..=BUBBLE_MAX_RADIUS).contains(&r));
        }
    }
}
