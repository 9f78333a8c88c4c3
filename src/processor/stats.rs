//! Summary statistics over a series snapshot.
//!
//! All functions are pure and return a neutral `0.0` for empty input rather
//! than failing.
use serde::{Deserialize, Serialize};

/// Smallest value, or `0.0` for an empty series.
pub fn min_value(series: &[f64]) -> f64 {
    series.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

/// Largest value, or `0.0` for an empty series.
pub fn max_value(series: &[f64]) -> f64 {
    series.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

/// Arithmetic mean, or `0.0` for an empty series.
pub fn average(series: &[f64]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    series.iter().sum::<f64>() / series.len() as f64
}

/// Means of consecutive, non-overlapping blocks of exactly `block_size` samples.
///
/// A trailing partial block is dropped. Returns an empty vector when
/// `block_size` is zero or larger than the series.
pub fn subset_averages(series: &[f64], block_size: usize) -> Vec<f64> {
    if block_size == 0 || block_size > series.len() {
        return Vec::new();
    }
    series.chunks_exact(block_size).map(average).collect()
}

/// Count, min, max and mean of one series.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SeriesStats {
    /// Number of samples
    pub count: usize,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
    /// Arithmetic mean
    pub average: f64,
}

impl SeriesStats {
    /// Compute all statistics in one go.
    pub fn of(series: &[f64]) -> Self {
        Self {
            count: series.len(),
            min: min_value(series),
            max: max_value(series),
            average: average(series),
        }
    }
}
