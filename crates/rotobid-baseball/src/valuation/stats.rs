// Pool-level aggregation: population mean and standard deviation.

use serde::{Deserialize, Serialize};

/// Mean and standard deviation for a single statistic across a player pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
}

/// Threshold below which standard deviation is treated as zero.
pub const STDEV_EPSILON: f64 = 1e-9;

/// Compute mean and standard deviation for a slice of values.
///
/// Uses the population standard deviation (N denominator): the pool is the
/// whole relevant player universe, not a sample.
///
/// Returns `None` when the pool is empty or the spread is zero, since no
/// z-score is defined in either case.
pub fn aggregate(values: &[f64]) -> Option<PoolStats> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let stdev = variance.sqrt();
    if !stdev.is_finite() || stdev < STDEV_EPSILON {
        return None;
    }
    Some(PoolStats { mean, stdev })
}

/// `(value - mean) / stdev`.
pub fn zscore(value: f64, stats: &PoolStats) -> f64 {
    (value - stats.mean) / stats.stdev
}

/// Standardize every value against the slice's own pool stats. All zeros
/// when the stats are undefined; the second element reports whether they were.
pub fn standardize(values: &[f64]) -> (Vec<f64>, bool) {
    match aggregate(values) {
        Some(stats) => (values.iter().map(|v| zscore(*v, &stats)).collect(), true),
        None => (vec![0.0; values.len()], false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn population_stats_for_three_values() {
        let stats = aggregate(&[10.0, 20.0, 30.0]).unwrap();
        assert!(approx_eq(stats.mean, 20.0, 1e-12));
        assert!(approx_eq(stats.stdev, (200.0f64 / 3.0).sqrt(), 1e-12));
        assert!(approx_eq(stats.stdev, 8.165, 1e-3));
    }

    #[test]
    fn empty_pool_is_undefined() {
        assert!(aggregate(&[]).is_none());
    }

    #[test]
    fn zero_spread_is_undefined() {
        assert!(aggregate(&[1.25, 1.25, 1.25]).is_none());
        let (z, defined) = standardize(&[4.0, 4.0]);
        assert!(!defined);
        assert_eq!(z, vec![0.0, 0.0]);
    }

    #[test]
    fn single_player_pool_is_undefined() {
        assert!(aggregate(&[42.0]).is_none());
    }

    #[test]
    fn standardized_values_have_zero_mean_unit_stdev() {
        let values = [3.0, 7.0, 7.0, 19.0, 24.0, 0.5];
        let (z, defined) = standardize(&values);
        assert!(defined);
        let n = z.len() as f64;
        let mean = z.iter().sum::<f64>() / n;
        let sd = (z.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        assert!(approx_eq(mean, 0.0, 1e-12));
        assert!(approx_eq(sd, 1.0, 1e-12));
    }
}
