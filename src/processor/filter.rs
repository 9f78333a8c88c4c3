//! Filter selection and the streaming moving-average filter.
use crate::error::{AppResult, DaqError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// The filter applied after every batch insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// The filtered series mirrors the raw window (code 0).
    None,
    /// Mean of the most recent `filter_size` raw samples (code 1).
    #[default]
    MovingAverage,
    /// Reserved name, not implemented (code 2).
    Lowpass,
    /// Reserved name, not implemented (code 3).
    Highpass,
}

impl FilterKind {
    /// Reject the reserved kinds.
    pub fn ensure_implemented(self) -> AppResult<()> {
        match self {
            FilterKind::None | FilterKind::MovingAverage => Ok(()),
            FilterKind::Lowpass | FilterKind::Highpass => Err(DaqError::FeatureIncomplete(
                self.to_string(),
                "Only 'none' and 'moving_average' filters are available.".to_string(),
            )),
        }
    }
}

impl FromStr for FilterKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "none" => Ok(FilterKind::None),
            "1" | "moving_average" | "movingaverage" => Ok(FilterKind::MovingAverage),
            "2" | "lowpass" => Ok(FilterKind::Lowpass),
            "3" | "highpass" => Ok(FilterKind::Highpass),
            _ => Err("expected 0 (none), 1 (moving average), 2 (lowpass) or 3 (highpass)"),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::None => write!(f, "No Filter"),
            FilterKind::MovingAverage => write!(f, "Moving Average"),
            FilterKind::Lowpass => write!(f, "Lowpass"),
            FilterKind::Highpass => write!(f, "Highpass"),
        }
    }
}

/// How many filtered points a batch produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterGranularity {
    /// One point per batch, computed over the window tail.
    #[default]
    PerBatch,
    /// One point for every inserted sample with a full filter window behind it.
    PerSample,
}

impl FromStr for FilterGranularity {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "per_batch" | "batch" => Ok(FilterGranularity::PerBatch),
            "1" | "per_sample" | "sample" => Ok(FilterGranularity::PerSample),
            _ => Err("expected 0 (per batch) or 1 (per sample)"),
        }
    }
}

impl fmt::Display for FilterGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterGranularity::PerBatch => write!(f, "Per Batch"),
            FilterGranularity::PerSample => write!(f, "Per Sample"),
        }
    }
}

/// A simple moving average filter over a raw window.
#[derive(Debug, Clone, Copy)]
pub struct MovingAverage {
    window_size: usize,
}

impl MovingAverage {
    /// `window_size` must be non-zero; the processor guarantees it.
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    /// Mean of the `window_size` samples ending at index `end` (inclusive).
    fn mean_ending_at(&self, raw: &VecDeque<f64>, end: usize) -> Option<f64> {
        if self.window_size == 0 || end >= raw.len() || end + 1 < self.window_size {
            return None;
        }
        let start = end + 1 - self.window_size;
        let sum: f64 = raw.range(start..=end).sum();
        Some(sum / self.window_size as f64)
    }

    /// Filtered points produced by a batch whose last `inserted` samples are
    /// now at the tail of `raw`. Empty when the window is shorter than the filter.
    pub fn points_for_batch(
        &self,
        raw: &VecDeque<f64>,
        inserted: usize,
        granularity: FilterGranularity,
    ) -> Vec<f64> {
        if raw.is_empty() || inserted == 0 || raw.len() < self.window_size {
            return Vec::new();
        }
        let last = raw.len() - 1;
        match granularity {
            FilterGranularity::PerBatch => self.mean_ending_at(raw, last).into_iter().collect(),
            FilterGranularity::PerSample => {
                let first = raw.len() - inserted.min(raw.len());
                (first..=last)
                    .filter_map(|end| self.mean_ending_at(raw, end))
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(values: &[f64]) -> VecDeque<f64> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_per_batch_emits_single_tail_mean() {
        let filter = MovingAverage::new(3);
        let raw = window(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let points = filter.points_for_batch(&raw, 5, FilterGranularity::PerBatch);
        assert_eq!(points, vec![4.0]);
    }

    #[test]
    fn test_short_window_produces_nothing() {
        let filter = MovingAverage::new(3);
        let raw = window(&[1.0, 2.0]);
        assert!(filter
            .points_for_batch(&raw, 2, FilterGranularity::PerBatch)
            .is_empty());
    }

    #[test]
    fn test_per_sample_skips_positions_without_full_history() {
        let filter = MovingAverage::new(3);
        let raw = window(&[3.0, 6.0, 9.0, 12.0]);
        // All four are new; only indices 2 and 3 have three samples behind them.
        let points = filter.points_for_batch(&raw, 4, FilterGranularity::PerSample);
        assert_eq!(points, vec![6.0, 9.0]);
    }

    #[test]
    fn test_per_sample_only_covers_inserted_tail() {
        let filter = MovingAverage::new(2);
        let raw = window(&[0.0, 0.0, 0.0, 4.0, 8.0]);
        let points = filter.points_for_batch(&raw, 2, FilterGranularity::PerSample);
        assert_eq!(points, vec![2.0, 6.0]);
    }

    #[test]
    fn test_placeholder_kinds_not_implemented() {
        assert!(FilterKind::MovingAverage.ensure_implemented().is_ok());
        assert!(FilterKind::None.ensure_implemented().is_ok());
        assert!(FilterKind::Highpass.ensure_implemented().is_err());
    }

    #[test]
    fn test_parse_filter_codes() {
        assert_eq!("0".parse(), Ok(FilterKind::None));
        assert_eq!("1".parse(), Ok(FilterKind::MovingAverage));
        assert_eq!("lowpass".parse(), Ok(FilterKind::Lowpass));
        assert!("9".parse::<FilterKind>().is_err());
        assert_eq!("per_sample".parse(), Ok(FilterGranularity::PerSample));
    }
}
