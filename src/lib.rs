//! # Sensor DAQ Core Library
//!
//! A simulated sensor feeding a sliding-window processor. The sensor produces
//! samples on a background tokio task into a bounded buffer; a polling
//! orchestrator moves batches into the processor, which keeps a raw window, a
//! moving-average series and their statistics.
//!
//! ## Crate Structure
//!
//! - **`sensor`**: `SampleSource`, the generation modes and the seeded sample generator.
//! - **`processor`**: `SlidingWindowProcessor`, the window insertion policy, the
//!   moving-average filter and series statistics.
//! - **`app`**: `AppContext` and the polling `Orchestrator`.
//! - **`command`**: The line-oriented `set`/`start`/`stop` command surface.
//! - **`report`**: Snapshot sinks and text rendering.
//! - **`config`**: Layered TOML and environment configuration via `figment`.
//! - **`logging`**: `tracing` subscriber setup.
//! - **`error`**: The crate-wide `DaqError` enum.
//! - **`validation`**: Shared validators used by config loading and runtime setters.

pub mod app;
pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod processor;
pub mod report;
pub mod sensor;
pub mod validation;

pub use app::{AppContext, Orchestrator, Outcome};
pub use config::PipelineConfig;
pub use error::{AppResult, DaqError};
pub use processor::{ProcessorSnapshot, SlidingWindowProcessor};
pub use sensor::SampleSource;
