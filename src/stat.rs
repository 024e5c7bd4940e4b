// Numeric helpers shared by the chart transformer and the statistics table.

/// Linear-interpolated percentile of already sorted data, `p` in [0, 1].
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 { return f64::NAN; }
    if n == 1 { return sorted_data[0]; }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1 denominator). `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 { return None; }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(var.sqrt())
}

fn linspace(lo: f64, hi: f64, n_edges: usize) -> Vec<f64> {
    let step = (hi - lo) / (n_edges - 1) as f64;
    (0..n_edges)
        .map(|i| if i == n_edges - 1 { hi } else { lo + step * i as f64 })
        .collect()
}

/// Equal-width histogram over the data range.
/// Returns `bins + 1` edges and `bins` counts; the last bin is closed on the right.
pub fn histogram(values: &[f64], bins: usize) -> (Vec<f64>, Vec<usize>) {
    let (mut lo, mut hi) = if values.is_empty() {
        (0.0, 1.0)
    } else {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (min, max)
    };
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let edges = linspace(lo, hi, bins + 1);
    let width = hi - lo;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = ((v - lo) * bins as f64 / width).floor() as usize;
        counts[idx.min(bins - 1)] += 1;
    }
    (edges, counts)
}

/// Equal-width, right-closed bin edges over the data range. The first edge
/// is nudged below the minimum so the smallest value falls in the first bin.
/// Duplicate edges are collapsed.
pub fn cut_edges(values: &[f64], bins: usize) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut edges = if lo == hi {
        let adj = if lo != 0.0 { 0.001 * lo.abs() } else { 0.001 };
        lo -= adj;
        hi += adj;
        linspace(lo, hi, bins + 1)
    } else {
        let mut e = linspace(lo, hi, bins + 1);
        e[0] -= (hi - lo) * 0.001;
        e
    };
    edges.dedup();
    edges
}

/// Index of the right-closed interval `(edges[i], edges[i + 1]]` holding `v`.
pub fn bin_index(edges: &[f64], v: f64) -> Option<usize> {
    let pos = edges.partition_point(|&e| e < v);
    if pos == 0 || pos >= edges.len() {
        None
    } else {
        Some(pos - 1)
    }
}

/// Round the way interval labels are rounded: `precision` decimals for values
/// with a whole part, `precision` significant fractional digits otherwise.
fn round_frac(x: f64, precision: i32) -> f64 {
    if !x.is_finite() || x.fract() == 0.0 {
        return x;
    }
    let digits = if x.trunc() == 0.0 {
        -(x.fract().abs().log10().floor() as i32) - 1 + precision
    } else {
        precision
    };
    let scale = 10f64.powi(digits);
    (x * scale).round() / scale
}

/// Float rendering with a trailing `.0` for integral values.
pub fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

/// Labels like `(0.991, 1.9]` for consecutive bin edges.
pub fn interval_labels(edges: &[f64]) -> Vec<String> {
    let mut precision = 3;
    let mut rounded: Vec<f64> = edges.iter().map(|&e| round_frac(e, precision)).collect();
    while precision < 20 && rounded.windows(2).any(|w| w[0] == w[1]) {
        precision += 1;
        rounded = edges.iter().map(|&e| round_frac(e, precision)).collect();
    }
    rounded
        .windows(2)
        .map(|w| format!("({}, {}]", format_float(w[0]), format_float(w[1])))
        .collect()
}

/// Pearson correlation over rows where both values are present.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    (sxy / denom).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&data, 0.5), 2.5);
        assert_eq!(percentile(&data, 0.25), 1.75);
        assert!(percentile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_sample_std() {
        let std = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((std - 2.138).abs() < 1e-3);
        assert!(sample_std(&[1.0]).is_none());
    }

    #[test]
    fn test_histogram_counts_everything() {
        let values: Vec<f64> = (0..=100).map(|v| v as f64).collect();
        let (edges, counts) = histogram(&values, 20);
        assert_eq!(edges.len(), 21);
        assert_eq!(counts.len(), 20);
        assert_eq!(counts.iter().sum::<usize>(), 101);
        // max lands in the last, right-closed bin
        assert_eq!(counts[19], 6);
    }

    #[test]
    fn test_histogram_degenerate_range() {
        let (edges, counts) = histogram(&[5.0, 5.0], 20);
        assert_eq!(edges[0], 4.5);
        assert_eq!(counts.iter().sum::<usize>(), 2);
        let (edges, counts) = histogram(&[], 20);
        assert_eq!(edges[0], 0.0);
        assert_eq!(counts.iter().sum::<usize>(), 0);
    }

    #[test]
    fn test_cut_edges_and_bins() {
        let values = [1.0, 2.0, 3.0, 4.0, 10.0];
        let edges = cut_edges(&values, 10);
        assert_eq!(edges.len(), 11);
        assert!(edges[0] < 1.0);
        assert_eq!(bin_index(&edges, 1.0), Some(0));
        assert_eq!(bin_index(&edges, 10.0), Some(9));
        assert_eq!(bin_index(&edges, 1.5), Some(0));
        assert_eq!(bin_index(&edges, 2.5), Some(1));
    }

    #[test]
    fn test_interval_labels() {
        let edges = cut_edges(&[1.0, 10.0], 10);
        let labels = interval_labels(&edges);
        assert_eq!(labels.len(), 10);
        assert_eq!(labels[0], "(0.991, 1.9]");
        assert_eq!(labels[9], "(9.1, 10.0]");
    }

    #[test]
    fn test_pearson() {
        let xs = [Some(1.0), Some(2.0), Some(3.0), None];
        let ys = [Some(2.0), Some(4.0), Some(6.0), Some(1.0)];
        assert!((pearson(&xs, &ys) - 1.0).abs() < 1e-12);
        let flat = [Some(1.0), Some(1.0), Some(1.0), Some(1.0)];
        assert!(pearson(&xs, &flat).is_nan());
    }
}
