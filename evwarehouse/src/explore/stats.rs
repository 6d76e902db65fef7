//! Descriptive statistics over a numeric sample.

use serde::{Deserialize, Serialize};

/// Summary statistics for one field.
///
/// Dispersion uses sample statistics (divide by n - 1), so a single value has
/// no standard deviation, variance, or coefficient of variation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Number of values after filtering.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Median (50th percentile).
    pub median: f64,
    /// Smallest of the most frequent values.
    pub mode: f64,
    /// Minimum.
    pub min: f64,
    /// Maximum.
    pub max: f64,
    /// Q3 - Q1.
    pub iqr: f64,
    /// Sample standard deviation.
    pub std_dev: Option<f64>,
    /// Sample variance.
    pub variance: Option<f64>,
    /// Standard deviation as a percentage of the mean.
    pub coefficient_of_variation: Option<f64>,
}

impl SummaryStats {
    /// Computes statistics, or `None` when there are no values.
    ///
    /// NaN inputs are ignored.
    #[must_use]
    pub fn compute(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        #[allow(clippy::cast_precision_loss)]
        let n_f = n as f64;
        let mean = sorted.iter().sum::<f64>() / n_f;

        let variance = (n > 1).then(|| {
            sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n_f - 1.0)
        });
        let std_dev = variance.map(f64::sqrt);
        let coefficient_of_variation = std_dev
            .filter(|_| mean != 0.0)
            .map(|sd| sd / mean * 100.0);

        Some(Self {
            count: n,
            mean,
            median: quantile(&sorted, 0.5),
            mode: mode(&sorted),
            min: sorted[0],
            max: sorted[n - 1],
            iqr: quantile(&sorted, 0.75) - quantile(&sorted, 0.25),
            std_dev,
            variance,
            coefficient_of_variation,
        })
    }
}

/// Quantile with linear interpolation between closest ranks.
///
/// `sorted` must be non-empty and ascending.
#[must_use]
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    #[allow(clippy::cast_precision_loss)]
    let position = q * (sorted.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = position - position.floor();
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Median of the values, ignoring NaN. `None` for an empty sample.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    Some(quantile(&sorted, 0.5))
}

// Sorted input means the first run of the maximum length holds the smallest
// modal value.
fn mode(sorted: &[f64]) -> f64 {
    let mut best = sorted[0];
    let mut best_run = 0;
    let mut run_start = 0;

    for i in 1..=sorted.len() {
        if i == sorted.len() || sorted[i] != sorted[run_start] {
            let run = i - run_start;
            if run > best_run {
                best_run = run;
                best = sorted[run_start];
            }
            run_start = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_basic_statistics() {
        let stats = SummaryStats::compute(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();

        assert_eq!(stats.count, 8);
        assert!(approx(stats.mean, 5.0));
        assert!(approx(stats.median, 4.5));
        assert!(approx(stats.mode, 4.0));
        assert!(approx(stats.min, 2.0));
        assert!(approx(stats.max, 9.0));
        // Q1 = 4.0, Q3 = 5.5
        assert!(approx(stats.iqr, 1.5));
        // Sample variance: 32 / 7
        assert!(approx(stats.variance.unwrap(), 32.0 / 7.0));
        assert!(approx(stats.std_dev.unwrap(), (32.0_f64 / 7.0).sqrt()));
        assert!(approx(
            stats.coefficient_of_variation.unwrap(),
            (32.0_f64 / 7.0).sqrt() / 5.0 * 100.0
        ));
    }

    #[test]
    fn test_empty_sample() {
        assert!(SummaryStats::compute(&[]).is_none());
        assert!(SummaryStats::compute(&[f64::NAN]).is_none());
        assert!(median(&[]).is_none());
    }

    #[test]
    fn test_single_value_has_no_dispersion() {
        let stats = SummaryStats::compute(&[42.0]).unwrap();
        assert!(approx(stats.mean, 42.0));
        assert!(approx(stats.iqr, 0.0));
        assert!(stats.std_dev.is_none());
        assert!(stats.variance.is_none());
        assert!(stats.coefficient_of_variation.is_none());
    }

    #[test]
    fn test_mode_ties_pick_smallest() {
        let stats = SummaryStats::compute(&[3.0, 1.0, 3.0, 1.0, 2.0]).unwrap();
        assert!(approx(stats.mode, 1.0));
    }

    #[test]
    fn test_quantile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(quantile(&sorted, 0.25), 1.75));
        assert!(approx(quantile(&sorted, 0.5), 2.5));
        assert!(approx(quantile(&sorted, 0.75), 3.25));
        assert!(approx(quantile(&sorted, 1.0), 4.0));
    }

    #[test]
    fn test_median_even_count() {
        assert!(approx(median(&[150.0, 60.0]).unwrap(), 105.0));
    }

    #[test]
    fn test_zero_mean_has_no_cv() {
        let stats = SummaryStats::compute(&[-1.0, 1.0]).unwrap();
        assert!(stats.std_dev.is_some());
        assert!(stats.coefficient_of_variation.is_none());
    }
}
