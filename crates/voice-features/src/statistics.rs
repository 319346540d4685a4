//! Statistical helpers shared by the calculators

/// Summary of a sequence of values
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    /// Compute the summary of a slice of values; `None` when empty
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let min = values.iter().cloned().fold(f64::MAX, f64::min);
        let max = values.iter().cloned().fold(f64::MIN, f64::max);
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            count: values.len(),
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
        })
    }
}

/// Arithmetic mean; `None` when empty
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Least-squares line through `(x, y)`, returned as `(slope, intercept)`.
///
/// `None` when fewer than two points are given or all `x` are equal.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let mx = x[..n].iter().sum::<f64>() / n as f64;
    let my = y[..n].iter().sum::<f64>() / n as f64;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (xi, yi) in x[..n].iter().zip(&y[..n]) {
        sxx += (xi - mx) * (xi - mx);
        sxy += (xi - mx) * (yi - my);
    }
    if sxx <= 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, my - slope * mx))
}

/// Equal-width histogram over `[min, max]`, last bin closed.
///
/// A zero-width range is widened to `[v - 0.5, v + 0.5]`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<usize> {
    let mut counts = vec![0; bins];
    let Some(summary) = Summary::compute(values) else {
        return counts;
    };
    if bins == 0 {
        return counts;
    }

    let (lo, hi) = if summary.max > summary.min {
        (summary.min, summary.max)
    } else {
        (summary.min - 0.5, summary.max + 0.5)
    };
    let width = (hi - lo) / bins as f64;
    for &v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
}

/// Shannon entropy (nats) of non-negative weights, normalized to sum to one
/// after adding `epsilon` to each weight.
pub fn shannon_entropy(weights: &[f64], epsilon: f64) -> Option<f64> {
    let shifted: Vec<f64> = weights.iter().map(|w| w + epsilon).collect();
    let total: f64 = shifted.iter().sum();
    if !(total > 0.0) {
        return None;
    }
    Some(
        -shifted
            .iter()
            .map(|w| w / total)
            .filter(|&p| p > 0.0)
            .map(|p| p * p.ln())
            .sum::<f64>(),
    )
}
