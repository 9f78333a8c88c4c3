//! Simulated sensor: sample generation and the bounded sample buffer.
pub mod generator;
pub mod modes;
pub mod source;

pub use modes::{CollectPolicy, LimitMode, TimingMode, ValueMode};
pub use source::SampleSource;
