//! The simulated sensor and its bounded sample buffer.
//!
//! A [`SampleSource`] appends one sample per tick from a background tokio task.
//! The buffer, its capacity (held in the settings) and the ready flag share one
//! `parking_lot::Mutex`; every read-modify-write takes it once and releases it
//! before any sleep.
//!
//! The generation task observes a `watch` stop signal on every iteration and is
//! awaited by [`SampleSource::stop_generation`]. Dropping the source also ends
//! the task, since the stop sender goes away with it.

use crate::config::{SensorConfig, MAX_BUFFER_CAPACITY};
use crate::error::{AppResult, DaqError};
use crate::sensor::generator::SampleGenerator;
use crate::sensor::modes::{CollectPolicy, LimitMode, TimingMode, ValueMode};
use crate::validation::{
    is_finite, is_in_range, is_positive_millis, is_strictly_ordered, parse_value as parse,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct SourceState {
    settings: SensorConfig,
    buffer: VecDeque<f64>,
    ready: bool,
    generator: SampleGenerator,
}

impl SourceState {
    /// Generate one sample, append it, raise ready. Returns the sample and the
    /// delay before the next tick.
    fn tick(&mut self) -> (f64, Duration) {
        let value = self.generator.next_value(&self.settings);
        if self.buffer.len() >= self.settings.buffer_capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);
        self.ready = true;
        (value, self.generator.next_delay(&self.settings))
    }

    fn resize(&mut self, capacity: usize) -> AppResult<()> {
        is_in_range(capacity, 1..MAX_BUFFER_CAPACITY).map_err(|_| {
            DaqError::invalid(
                "databuffersize",
                format!("must be greater than 0 and less than {MAX_BUFFER_CAPACITY}"),
            )
        })?;
        if capacity < self.buffer.len() {
            let excess = self.buffer.len() - capacity;
            self.buffer.drain(..excess);
        }
        self.settings.buffer_capacity = capacity;
        Ok(())
    }
}

struct GenerationTask {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Simulated sensor with a bounded, thread-safe sample buffer.
pub struct SampleSource {
    state: Arc<Mutex<SourceState>>,
    task: Mutex<Option<GenerationTask>>,
}

impl SampleSource {
    /// Create a source with an empty buffer. Generation does not start until
    /// [`start_generation`](Self::start_generation).
    pub fn new(settings: SensorConfig) -> AppResult<Self> {
        settings.validate()?;
        Ok(Self::from_settings(settings))
    }

    fn from_settings(settings: SensorConfig) -> Self {
        let generator = SampleGenerator::new(settings.seed);
        Self {
            state: Arc::new(Mutex::new(SourceState {
                buffer: VecDeque::with_capacity(settings.buffer_capacity),
                settings,
                ready: false,
                generator,
            })),
            task: Mutex::new(None),
        }
    }

    /// Current settings.
    pub fn settings(&self) -> SensorConfig {
        self.state.lock().settings.clone()
    }

    /// Spawn the generation task on the current tokio runtime.
    ///
    /// Fails with [`DaqError::GenerationAlreadyRunning`] if a task is live.
    pub fn start_generation(&self) -> AppResult<()> {
        let mut task = self.task.lock();
        if let Some(existing) = task.as_ref() {
            if !existing.handle.is_finished() {
                return Err(DaqError::GenerationAlreadyRunning);
            }
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(generation_loop(state, stop_rx));
        *task = Some(GenerationTask { stop_tx, handle });
        info!("Sample generation started");
        Ok(())
    }

    /// Signal the generation task to stop and wait for it to exit.
    pub async fn stop_generation(&self) -> AppResult<()> {
        let task = self.task.lock().take();
        let Some(GenerationTask { stop_tx, handle }) = task else {
            return Err(DaqError::GenerationNotRunning);
        };

        // A closed channel means the task already exited.
        let _ = stop_tx.send(true);
        match handle.await {
            Ok(()) => info!("Sample generation stopped"),
            Err(e) if e.is_panic() => warn!("Generation task had already failed: {e}"),
            Err(e) => return Err(DaqError::Processing(format!("generation task failed: {e}"))),
        }
        Ok(())
    }

    /// True while a generation task is live.
    pub fn is_generating(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    /// Run one generation step synchronously and return the appended sample.
    ///
    /// This is the same step the background task performs, without the delay.
    pub fn tick(&self) -> f64 {
        let (value, _) = self.state.lock().tick();
        value
    }

    /// True when a sample has been appended since the last [`clear_ready`](Self::clear_ready).
    pub fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    /// Lower the ready flag after acting on a collect.
    pub fn clear_ready(&self) {
        self.state.lock().ready = false;
    }

    /// Number of samples currently buffered.
    pub fn len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.state.lock().buffer.is_empty()
    }

    /// Copy of the buffer, oldest first.
    pub fn buffer(&self) -> Vec<f64> {
        self.state.lock().buffer.iter().copied().collect()
    }

    /// Read `n` samples without removing them.
    ///
    /// Returns an empty vector when fewer than `n` samples are buffered. Under
    /// [`CollectPolicy::Decoupled`] the result is the most recent `n` samples;
    /// under [`CollectPolicy::Coupled`] the capacity is first changed to `n` and
    /// the whole buffer is returned.
    pub fn collect_data(&self, n: usize) -> Vec<f64> {
        let mut state = self.state.lock();
        if state.settings.collect_policy == CollectPolicy::Coupled
            && n != state.settings.buffer_capacity
        {
            if let Err(e) = state.resize(n) {
                warn!("{e}");
                return Vec::new();
            }
        }

        let len = state.buffer.len();
        if n == 0 || len < n {
            return Vec::new();
        }
        state.buffer.range(len - n..).copied().collect()
    }

    /// Change the buffer capacity. Shrinking drops the oldest excess samples.
    pub fn set_buffer_capacity(&self, capacity: usize) -> AppResult<()> {
        self.state
            .lock()
            .resize(capacity)
            .inspect_err(|e| warn!("{e}"))?;
        info!(capacity, "Buffer capacity set");
        Ok(())
    }

    /// Select periodic or aperiodic timing.
    pub fn set_timing_mode(&self, timing: TimingMode) {
        self.state.lock().settings.timing = timing;
        info!(%timing, "Timing mode set");
    }

    /// Select random or deterministic values.
    pub fn set_value_mode(&self, value_mode: ValueMode) {
        self.state.lock().settings.value_mode = value_mode;
        info!(%value_mode, "Value mode set");
    }

    /// Select bounded or unbounded values.
    pub fn set_limit_mode(&self, limit: LimitMode) {
        self.state.lock().settings.limit = limit;
        info!(%limit, "Limit mode set");
    }

    /// Select how `collect_data` treats the capacity.
    pub fn set_collect_policy(&self, policy: CollectPolicy) {
        self.state.lock().settings.collect_policy = policy;
        info!(%policy, "Collect policy set");
    }

    /// Set both bounds; requires `lower < upper`.
    pub fn set_bounds(&self, lower: f64, upper: f64) -> AppResult<()> {
        let mut state = self.state.lock();
        apply_bounds(&mut state.settings, lower, upper, "bounds")
    }

    /// Set the lower bound; must stay below the current upper bound.
    pub fn set_lower_bound(&self, lower: f64) -> AppResult<()> {
        let mut state = self.state.lock();
        let upper = state.settings.upper_bound;
        apply_bounds(&mut state.settings, lower, upper, "lowerbound")
    }

    /// Set the upper bound; must stay above the current lower bound.
    pub fn set_upper_bound(&self, upper: f64) -> AppResult<()> {
        let mut state = self.state.lock();
        let lower = state.settings.lower_bound;
        apply_bounds(&mut state.settings, lower, upper, "upperbound")
    }

    /// Set the periodic delay in milliseconds.
    pub fn set_period(&self, period_ms: u64) -> AppResult<()> {
        is_positive_millis(period_ms).map_err(|e| DaqError::invalid("period", e))?;
        self.state.lock().settings.period_ms = period_ms;
        info!(period_ms, "Period set");
        Ok(())
    }

    /// Set the shortest aperiodic delay; must be positive and below the maximum.
    pub fn set_min_period(&self, min_period_ms: u64) -> AppResult<()> {
        is_positive_millis(min_period_ms).map_err(|e| DaqError::invalid("minperiod", e))?;
        let mut state = self.state.lock();
        let max = state.settings.max_period_ms;
        is_strictly_ordered(min_period_ms, max).map_err(|_| {
            DaqError::invalid("minperiod", format!("must be less than maxperiod ({max} ms)"))
        })?;
        state.settings.min_period_ms = min_period_ms;
        info!(min_period_ms, "Minimum period set");
        Ok(())
    }

    /// Set the longest aperiodic delay; must be above the minimum.
    pub fn set_max_period(&self, max_period_ms: u64) -> AppResult<()> {
        let mut state = self.state.lock();
        let min = state.settings.min_period_ms;
        is_strictly_ordered(min, max_period_ms).map_err(|_| {
            DaqError::invalid(
                "maxperiod",
                format!("must be greater than minperiod ({min} ms)"),
            )
        })?;
        state.settings.max_period_ms = max_period_ms;
        info!(max_period_ms, "Maximum period set");
        Ok(())
    }

    /// Apply a named option from the command surface.
    pub fn configure(&self, option: &str, value: &str) -> AppResult<()> {
        match option {
            "timing" => self.set_timing_mode(parse(option, value)?),
            "valuetype" => self.set_value_mode(parse(option, value)?),
            "limit" => self.set_limit_mode(parse(option, value)?),
            "collectpolicy" => self.set_collect_policy(parse(option, value)?),
            "lowerbound" => self.set_lower_bound(parse(option, value)?)?,
            "upperbound" => self.set_upper_bound(parse(option, value)?)?,
            "period" => self.set_period(parse(option, value)?)?,
            "minperiod" => self.set_min_period(parse(option, value)?)?,
            "maxperiod" => self.set_max_period(parse(option, value)?)?,
            "databuffersize" => self.set_buffer_capacity(parse(option, value)?)?,
            _ => {
                return Err(DaqError::UnknownOption {
                    component: "sensor".to_string(),
                    option: option.to_string(),
                })
            }
        }
        Ok(())
    }
}

impl Default for SampleSource {
    fn default() -> Self {
        Self::from_settings(SensorConfig::default())
    }
}

fn apply_bounds(settings: &mut SensorConfig, lower: f64, upper: f64, option: &str) -> AppResult<()> {
    is_finite(lower).map_err(|e| DaqError::invalid(option, e))?;
    is_finite(upper).map_err(|e| DaqError::invalid(option, e))?;
    is_strictly_ordered(lower, upper).map_err(|_| {
        warn!(lower, upper, "Bounds rejected");
        DaqError::invalid(
            option,
            format!("lower bound ({lower}) must be less than upper bound ({upper})"),
        )
    })?;
    is_finite(upper - lower).map_err(|_| {
        warn!(lower, upper, "Bounds rejected");
        DaqError::invalid(option, "range width must be finite")
    })?;
    settings.lower_bound = lower;
    settings.upper_bound = upper;
    info!(lower, upper, "Bounds set");
    Ok(())
}

async fn generation_loop(state: Arc<Mutex<SourceState>>, mut stop_rx: watch::Receiver<bool>) {
    loop {
        if *stop_rx.borrow() {
            break;
        }

        let (value, delay) = state.lock().tick();
        debug!(value, delay_ms = delay.as_millis() as u64, "Sample generated");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(capacity: usize) -> SampleSource {
        SampleSource::new(SensorConfig {
            buffer_capacity: capacity,
            seed: Some(11),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_tick_respects_capacity() {
        let s = source(3);
        for _ in 0..10 {
            s.tick();
            assert!(s.len() <= 3);
        }
        assert_eq!(s.len(), 3);
        assert!(s.is_ready());
    }

    #[test]
    fn test_tick_evicts_oldest() {
        let s = source(2);
        s.tick();
        let b = s.tick();
        let c = s.tick();
        assert_eq!(s.buffer(), vec![b, c]);
    }

    #[test]
    fn test_shrink_keeps_most_recent() {
        let s = source(5);
        let values: Vec<f64> = (0..5).map(|_| s.tick()).collect();
        s.set_buffer_capacity(2).unwrap();
        assert_eq!(s.buffer(), values[3..].to_vec());
        assert_eq!(s.settings().buffer_capacity, 2);
    }

    #[test]
    fn test_grow_keeps_contents() {
        let s = source(2);
        let values: Vec<f64> = (0..2).map(|_| s.tick()).collect();
        s.set_buffer_capacity(6).unwrap();
        assert_eq!(s.buffer(), values);
    }

    #[test]
    fn test_collect_requires_enough_samples() {
        let s = source(5);
        s.tick();
        s.tick();
        assert!(s.collect_data(3).is_empty());
        s.tick();
        assert_eq!(s.collect_data(3).len(), 3);
        assert!(s.collect_data(0).is_empty());
    }

    #[test]
    fn test_decoupled_collect_leaves_capacity() {
        let s = source(6);
        let values: Vec<f64> = (0..6).map(|_| s.tick()).collect();
        assert_eq!(s.collect_data(2), values[4..].to_vec());
        assert_eq!(s.settings().buffer_capacity, 6);
        assert_eq!(s.len(), 6);
    }

    #[test]
    fn test_coupled_collect_resizes() {
        let s = source(6);
        s.set_collect_policy(CollectPolicy::Coupled);
        let values: Vec<f64> = (0..6).map(|_| s.tick()).collect();
        assert_eq!(s.collect_data(4), values[2..].to_vec());
        assert_eq!(s.settings().buffer_capacity, 4);
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn test_clear_ready() {
        let s = source(2);
        assert!(!s.is_ready());
        s.tick();
        assert!(s.is_ready());
        s.clear_ready();
        assert!(!s.is_ready());
    }

    #[test]
    fn test_rejected_settings_leave_state() {
        let s = source(4);
        assert!(s.set_buffer_capacity(0).is_err());
        assert!(s.set_period(0).is_err());
        assert!(s.set_lower_bound(100.0).is_err());
        assert!(s.set_upper_bound(0.0).is_err());
        assert!(s.set_min_period(2000).is_err());
        assert!(s.set_max_period(100).is_err());
        assert_eq!(s.settings(), source(4).settings());
    }

    #[test]
    fn test_configure_by_name() {
        let s = source(4);
        s.configure("timing", "0").unwrap();
        s.configure("valuetype", "deterministic").unwrap();
        s.configure("upperbound", "50").unwrap();
        let settings = s.settings();
        assert_eq!(settings.timing, TimingMode::Aperiodic);
        assert_eq!(settings.value_mode, ValueMode::Deterministic);
        assert_eq!(settings.upper_bound, 50.0);
        assert!(s.configure("timing", "7").is_err());
        assert!(matches!(
            s.configure("gain", "1"),
            Err(DaqError::UnknownOption { .. })
        ));
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let s = source(4);
        s.start_generation().unwrap();
        assert!(matches!(
            s.start_generation(),
            Err(DaqError::GenerationAlreadyRunning)
        ));
        s.stop_generation().await.unwrap();
        assert!(!s.is_generating());
    }

    #[test]
    fn test_bounds_with_infinite_width_rejected() {
        for mode in [ValueMode::Random, ValueMode::Deterministic] {
            let s = source(4);
            s.set_value_mode(mode);
            s.set_lower_bound(-1e308).unwrap();
            assert!(s.set_upper_bound(1e308).is_err());
            assert!(s.set_bounds(-1e308, 1e308).is_err());
            assert_eq!(s.settings().upper_bound, 100.0);
            for _ in 0..5 {
                assert!(s.tick().is_finite());
            }
        }
    }

    #[test]
    fn test_oversized_capacity_rejected() {
        let s = source(4);
        assert!(s.set_buffer_capacity(usize::MAX).is_err());
        assert!(s.configure("databuffersize", "18446744073709551615").is_err());
        assert_eq!(s.settings().buffer_capacity, 4);
    }

    #[tokio::test]
    async fn test_stop_after_failed_task_is_not_fatal() {
        let s = source(4);
        let (stop_tx, _stop_rx) = watch::channel(false);
        let handle: JoinHandle<()> = tokio::spawn(async { panic!("generator failed") });
        *s.task.lock() = Some(GenerationTask { stop_tx, handle });
        tokio::task::yield_now().await;

        assert!(s.stop_generation().await.is_ok());
        assert!(!s.is_generating());
        assert!(s.start_generation().is_ok());
        s.stop_generation().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_without_start() {
        let s = source(4);
        assert!(matches!(
            s.stop_generation().await,
            Err(DaqError::GenerationNotRunning)
        ));
    }
}
