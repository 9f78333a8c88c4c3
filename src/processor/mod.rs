//! Sliding-window processing of sensor batches.
//!
//! [`SlidingWindowProcessor`] owns a fixed-capacity raw window and a filtered
//! series of the same nominal capacity. Batches are copied in through
//! [`input_data`](SlidingWindowProcessor::input_data), which applies the window
//! insertion policy and then runs the active filter once.
//!
//! All state sits behind one `parking_lot::Mutex`, so batch insertion from the
//! polling task and configuration changes from the command task never
//! interleave.
pub mod filter;
pub mod stats;
pub mod window;

use crate::config::{ProcessorConfig, MAX_WINDOW_CAPACITY};
use crate::error::{AppResult, DaqError};
use crate::validation::{is_in_range, is_positive_count, parse_value as parse};
use filter::{FilterGranularity, FilterKind, MovingAverage};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use stats::SeriesStats;
use std::collections::VecDeque;
use tracing::{debug, info, warn};
use window::RawWindow;

/// Read-only view of the processor, for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorSnapshot {
    /// Raw window, oldest first
    pub raw: Vec<f64>,
    /// Filtered series, oldest first
    pub filtered: Vec<f64>,
    /// Block means of the raw window
    pub subset_averages: Vec<f64>,
    /// Statistics of `raw`
    pub raw_stats: SeriesStats,
    /// Statistics of `filtered`
    pub filtered_stats: SeriesStats,
}

struct ProcessorState {
    settings: ProcessorConfig,
    raw: RawWindow,
    filtered: VecDeque<f64>,
}

impl ProcessorState {
    /// Replace both windows with zero-filled ones of `capacity`, then record it.
    fn reset_windows(&mut self, capacity: usize) {
        let raw = RawWindow::zeroed(capacity);
        let filtered: VecDeque<f64> = std::iter::repeat(0.0).take(capacity).collect();
        self.raw = raw;
        self.filtered = filtered;
        self.settings.window_capacity = capacity;
    }

    fn filter(&mut self, inserted: usize) {
        match self.settings.filter_kind {
            FilterKind::MovingAverage => {
                let points = MovingAverage::new(self.settings.filter_size).points_for_batch(
                    self.raw.samples(),
                    inserted,
                    self.settings.filter_granularity,
                );
                let capacity = self.settings.window_capacity;
                for point in points {
                    self.filtered.push_back(point);
                    while self.filtered.len() > capacity {
                        self.filtered.pop_front();
                    }
                }
            }
            // Reserved kinds are rejected by the setters; mirror the raw window.
            FilterKind::None | FilterKind::Lowpass | FilterKind::Highpass => {
                self.filtered = self.raw.samples().clone();
            }
        }
    }
}

/// Fixed-capacity raw window plus a derived filtered series.
pub struct SlidingWindowProcessor {
    state: Mutex<ProcessorState>,
}

impl SlidingWindowProcessor {
    /// Create a processor with both windows zero-filled to `window_capacity`.
    pub fn new(settings: ProcessorConfig) -> AppResult<Self> {
        settings.validate()?;
        Ok(Self::from_settings(settings))
    }

    fn from_settings(settings: ProcessorConfig) -> Self {
        let capacity = settings.window_capacity;
        Self {
            state: Mutex::new(ProcessorState {
                raw: RawWindow::zeroed(capacity),
                filtered: std::iter::repeat(0.0).take(capacity).collect(),
                settings,
            }),
        }
    }

    /// Current settings.
    pub fn settings(&self) -> ProcessorConfig {
        self.state.lock().settings.clone()
    }

    /// Copy a batch into the raw window and run the filter once.
    ///
    /// An empty batch changes nothing.
    pub fn input_data(&self, batch: &[f64]) {
        if batch.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        let status = state.raw.status();
        let inserted = state.raw.insert(batch);
        state.filter(inserted);
        debug!(
            batch_len = batch.len(),
            ?status,
            raw_len = state.raw.len(),
            filtered_len = state.filtered.len(),
            "Batch absorbed"
        );
    }

    /// Raw window, oldest first.
    pub fn raw_data(&self) -> Vec<f64> {
        self.state.lock().raw.to_vec()
    }

    /// Filtered series, oldest first.
    pub fn filtered_data(&self) -> Vec<f64> {
        self.state.lock().filtered.iter().copied().collect()
    }

    /// Block means of the raw window; see [`stats::subset_averages`].
    pub fn subset_averages(&self, block_size: usize) -> Vec<f64> {
        stats::subset_averages(&self.raw_data(), block_size)
    }

    /// Consistent view of both windows and their statistics.
    pub fn snapshot(&self) -> ProcessorSnapshot {
        let (raw, filtered, block_size) = {
            let state = self.state.lock();
            (
                state.raw.to_vec(),
                state.filtered.iter().copied().collect::<Vec<_>>(),
                state.settings.subset_block_size,
            )
        };
        ProcessorSnapshot {
            subset_averages: stats::subset_averages(&raw, block_size),
            raw_stats: SeriesStats::of(&raw),
            filtered_stats: SeriesStats::of(&filtered),
            raw,
            filtered,
        }
    }

    /// Select the filter. Reserved kinds are rejected.
    pub fn set_filter_kind(&self, kind: FilterKind) -> AppResult<()> {
        kind.ensure_implemented().inspect_err(|e| warn!("{e}"))?;
        self.state.lock().settings.filter_kind = kind;
        info!(%kind, "Filter kind set");
        Ok(())
    }

    /// Set the moving-average length; must satisfy `0 < size < window_capacity`.
    pub fn set_filter_size(&self, size: usize) -> AppResult<()> {
        let mut state = self.state.lock();
        let capacity = state.settings.window_capacity;
        is_in_range(size, 1..capacity).map_err(|_| {
            let err = DaqError::invalid(
                "filtersize",
                format!("must be greater than 0 and less than the window capacity ({capacity})"),
            );
            warn!("{err}");
            err
        })?;
        state.settings.filter_size = size;
        info!(size, "Filter size set");
        Ok(())
    }

    /// Resize both windows. History is discarded and both windows are
    /// zero-filled to the new capacity.
    pub fn set_window_capacity(&self, capacity: usize) -> AppResult<()> {
        let mut state = self.state.lock();
        is_in_range(capacity, 1..MAX_WINDOW_CAPACITY).map_err(|_| {
            let err = DaqError::invalid(
                "numberofdatapoints",
                format!("must be greater than 0 and less than {MAX_WINDOW_CAPACITY}"),
            );
            warn!("{err}");
            err
        })?;
        if state.settings.filter_size >= capacity {
            let err = DaqError::invalid(
                "numberofdatapoints",
                format!(
                    "must be greater than the filter size ({})",
                    state.settings.filter_size
                ),
            );
            warn!("{err}");
            return Err(err);
        }
        state.reset_windows(capacity);
        info!(capacity, "Window capacity set, windows reset");
        Ok(())
    }

    /// Choose between one filtered point per batch and one per sample.
    pub fn set_filter_granularity(&self, granularity: FilterGranularity) {
        self.state.lock().settings.filter_granularity = granularity;
        info!(%granularity, "Filter granularity set");
    }

    /// Block size used for `subset_averages` in snapshots.
    pub fn set_subset_block_size(&self, block_size: usize) -> AppResult<()> {
        is_positive_count(block_size).map_err(|e| DaqError::invalid("subsetblocksize", e))?;
        self.state.lock().settings.subset_block_size = block_size;
        Ok(())
    }

    /// Apply a named option from the command surface.
    pub fn configure(&self, option: &str, value: &str) -> AppResult<()> {
        match option {
            "filtertype" => self.set_filter_kind(parse(option, value)?),
            "filtersize" => self.set_filter_size(parse(option, value)?),
            "numberofdatapoints" => self.set_window_capacity(parse(option, value)?),
            "filtergranularity" => {
                self.set_filter_granularity(parse(option, value)?);
                Ok(())
            }
            "subsetblocksize" => self.set_subset_block_size(parse(option, value)?),
            _ => Err(DaqError::UnknownOption {
                component: "processor".to_string(),
                option: option.to_string(),
            }),
        }
    }
}

impl Default for SlidingWindowProcessor {
    fn default() -> Self {
        Self::from_settings(ProcessorConfig::default())
    }
}
