//! Summary Statistics Module
//! Descriptive numbers for the dashboard header strip.

use crate::data::MergedIntersection;

/// One-pass summary of the merged dataset. All zero when the dataset is
/// empty; the header strip is hidden in that case anyway.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub count: usize,
    pub total: f64,
    pub mean: f64,
    pub median: f64,
    pub p95: f64,
    pub max: f64,
    /// Intersections whose signal status reads as "Si".
    pub signalized: usize,
    /// Intersections carrying a coordinate pair.
    pub with_coords: usize,
}

impl DatasetSummary {
    pub fn compute(intersections: &[MergedIntersection]) -> Self {
        let n = intersections.len();
        if n == 0 {
            return Self {
                count: 0,
                total: 0.0,
                mean: 0.0,
                median: 0.0,
                p95: 0.0,
                max: 0.0,
                signalized: 0,
                with_coords: 0,
            };
        }

        let mut sorted: Vec<f64> = intersections.iter().map(|i| i.total).collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let total: f64 = sorted.iter().sum();
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        Self {
            count: n,
            total,
            mean: total / n as f64,
            median,
            p95: percentile(&sorted, 95.0),
            max: sorted[n - 1],
            signalized: intersections.iter().filter(|i| is_signalized(&i.status)).count(),
            with_coords: intersections.iter().filter(|i| i.coords.is_some()).count(),
        }
    }
}

fn is_signalized(status: &str) -> bool {
    let status = status.trim().to_lowercase();
    status == "si" || status == "sí"
}

/// Percentile with linear interpolation (NumPy compatible).
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    let n = sorted_values.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted_values[0];
    }

    let rank = (p / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (rank.ceil() as usize).min(n - 1);
    let frac = rank - lower as f64;

    if lower == upper {
        sorted_values[lower]
    } else {
        sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
    }
}
