//! Configuration system using Figment
//!
//! Strongly-typed configuration for the sensor, the processor and the polling
//! orchestrator. Configuration is loaded from:
//! 1. `config/sensor_daq.toml` (or an explicit path)
//! 2. Environment variables prefixed with `SENSOR_DAQ_`, nested with `__`
//!
//! Every section has serde defaults, so a missing file or an empty table yields
//! the factory settings.
//!
//! # Example
//! ```no_run
//! use sensor_daq::config::PipelineConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::load()?;
//! config.validate()?;
//! println!("Window capacity: {}", config.processor.window_capacity);
//! # Ok(())
//! # }
//! ```

use crate::error::{AppResult, DaqError};
use crate::processor::filter::{FilterGranularity, FilterKind};
use crate::sensor::modes::{CollectPolicy, LimitMode, TimingMode, ValueMode};
use crate::validation::{
    is_finite, is_in_range, is_positive_count, is_positive_millis, is_strictly_ordered,
};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/sensor_daq.toml";

/// Prefix for environment overrides, e.g. `SENSOR_DAQ_SENSOR__PERIOD_MS=50`.
pub const ENV_PREFIX: &str = "SENSOR_DAQ_";

/// Exclusive upper limit for the orchestrator polling rate.
pub const MAX_POLLING_RATE_MS: u64 = 10_000;

/// Exclusive upper limit for the number of samples collected per poll.
pub const MAX_COLLECT_SIZE: usize = 1_000;

/// Exclusive upper limit for the sensor buffer capacity.
pub const MAX_BUFFER_CAPACITY: usize = 1_000_000;

/// Exclusive upper limit for the processor window capacity.
pub const MAX_WINDOW_CAPACITY: usize = 1_000_000;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Application settings
    pub application: ApplicationConfig,
    /// Simulated sensor settings
    pub sensor: SensorConfig,
    /// Sliding-window processor settings
    pub processor: ProcessorConfig,
    /// Polling loop settings
    pub orchestrator: OrchestratorConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Application name
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "Sensor DAQ".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Sensor configuration. Also serves as the live settings of a running
/// [`SampleSource`](crate::sensor::SampleSource).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Periodic or aperiodic sample timing
    pub timing: TimingMode,
    /// Random or deterministic values
    pub value_mode: ValueMode,
    /// Bounded or unbounded values
    pub limit: LimitMode,
    /// Smallest value produced under `LimitMode::Range`
    pub lower_bound: f64,
    /// Largest value produced under `LimitMode::Range`
    pub upper_bound: f64,
    /// Delay between samples in periodic mode
    pub period_ms: u64,
    /// Shortest delay in aperiodic mode
    pub min_period_ms: u64,
    /// Longest delay in aperiodic mode
    pub max_period_ms: u64,
    /// Number of samples retained by the sensor buffer
    pub buffer_capacity: usize,
    /// Whether reads resize the buffer
    pub collect_policy: CollectPolicy,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            timing: TimingMode::Periodic,
            value_mode: ValueMode::Random,
            limit: LimitMode::Range,
            lower_bound: 0.0,
            upper_bound: 100.0,
            period_ms: 100,
            min_period_ms: 100,
            max_period_ms: 2000,
            buffer_capacity: 10,
            collect_policy: CollectPolicy::Decoupled,
            seed: None,
        }
    }
}

impl SensorConfig {
    /// Check every invariant the runtime setters enforce.
    pub fn validate(&self) -> AppResult<()> {
        is_finite(self.lower_bound).map_err(|e| DaqError::invalid("lower_bound", e))?;
        is_finite(self.upper_bound).map_err(|e| DaqError::invalid("upper_bound", e))?;
        is_strictly_ordered(self.lower_bound, self.upper_bound)
            .map_err(|e| DaqError::invalid("bounds", e))?;
        is_finite(self.upper_bound - self.lower_bound)
            .map_err(|_| DaqError::invalid("bounds", "range width must be finite"))?;
        is_positive_millis(self.period_ms).map_err(|e| DaqError::invalid("period_ms", e))?;
        is_positive_millis(self.min_period_ms)
            .map_err(|e| DaqError::invalid("min_period_ms", e))?;
        is_strictly_ordered(self.min_period_ms, self.max_period_ms)
            .map_err(|_| DaqError::invalid("max_period_ms", "must be greater than min_period_ms"))?;
        is_in_range(self.buffer_capacity, 1..MAX_BUFFER_CAPACITY).map_err(|_| {
            DaqError::invalid(
                "buffer_capacity",
                format!("must be greater than 0 and less than {MAX_BUFFER_CAPACITY}"),
            )
        })?;
        Ok(())
    }
}

/// Processor configuration. Also serves as the live settings of a
/// [`SlidingWindowProcessor`](crate::processor::SlidingWindowProcessor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Active filter
    pub filter_kind: FilterKind,
    /// Number of raw samples averaged per filtered point
    pub filter_size: usize,
    /// Capacity of the raw and filtered windows
    pub window_capacity: usize,
    /// One filtered point per batch, or per inserted sample
    pub filter_granularity: FilterGranularity,
    /// Block size used for subset averages in snapshots
    pub subset_block_size: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            filter_kind: FilterKind::MovingAverage,
            filter_size: 5,
            window_capacity: 30,
            filter_granularity: FilterGranularity::PerBatch,
            subset_block_size: 5,
        }
    }
}

impl ProcessorConfig {
    /// Check every invariant the runtime setters enforce.
    pub fn validate(&self) -> AppResult<()> {
        self.filter_kind.ensure_implemented()?;
        is_in_range(self.window_capacity, 1..MAX_WINDOW_CAPACITY).map_err(|_| {
            DaqError::invalid(
                "window_capacity",
                format!("must be greater than 0 and less than {MAX_WINDOW_CAPACITY}"),
            )
        })?;
        is_in_range(self.filter_size, 1..self.window_capacity).map_err(|_| {
            DaqError::invalid(
                "filter_size",
                format!(
                    "must be greater than 0 and less than the window capacity ({})",
                    self.window_capacity
                ),
            )
        })?;
        is_positive_count(self.subset_block_size)
            .map_err(|e| DaqError::invalid("subset_block_size", e))?;
        Ok(())
    }
}

/// Polling loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Delay between readiness checks
    pub polling_rate_ms: u64,
    /// Samples requested from the sensor per poll
    pub collect_size: usize,
    /// Whether reports include the raw and filtered series
    pub print_data: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            polling_rate_ms: 100,
            collect_size: 5,
            print_data: true,
        }
    }
}

impl OrchestratorConfig {
    /// Check the polling limits.
    pub fn validate(&self) -> AppResult<()> {
        is_in_range(self.polling_rate_ms, 1..MAX_POLLING_RATE_MS).map_err(|_| {
            DaqError::invalid(
                "polling_rate_ms",
                format!("must be greater than 0 and less than {MAX_POLLING_RATE_MS}"),
            )
        })?;
        is_in_range(self.collect_size, 1..MAX_COLLECT_SIZE).map_err(|_| {
            DaqError::invalid(
                "collect_size",
                format!("must be greater than 0 and less than {MAX_COLLECT_SIZE}"),
            )
        })?;
        Ok(())
    }
}

impl PipelineConfig {
    /// Load configuration from the default file and environment variables
    ///
    /// Environment variables can override configuration with prefix `SENSOR_DAQ_`
    /// Example: `SENSOR_DAQ_APPLICATION__LOG_LEVEL=debug`
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let config = Self::figment(path.as_ref()).extract()?;
        Ok(config)
    }

    /// The provider stack used by [`load_from`](Self::load_from).
    pub fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> AppResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(DaqError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        self.sensor
            .validate()
            .map_err(|e| DaqError::Configuration(format!("[sensor] {e}")))?;
        self.processor
            .validate()
            .map_err(|e| DaqError::Configuration(format!("[processor] {e}")))?;
        self.orchestrator
            .validate()
            .map_err(|e| DaqError::Configuration(format!("[orchestrator] {e}")))?;

        Ok(())
    }
}
