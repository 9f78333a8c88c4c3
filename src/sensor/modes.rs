//! Operating modes for the simulated sensor.
//!
//! Each mode can be parsed from its numeric command code (the form used by
//! `set timing 1`) or from its name, and serializes as its lowercase name in
//! configuration files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inter-sample timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingMode {
    /// Uniform random delay in `[min_period_ms, max_period_ms]` (code 0).
    Aperiodic,
    /// Fixed `period_ms` between samples (code 1).
    #[default]
    Periodic,
}

/// How sample values are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueMode {
    /// Pseudo-random draw (code 0).
    #[default]
    Random,
    /// Repeatable sawtooth driven by a step counter (code 1).
    Deterministic,
}

/// Value range for generated samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitMode {
    /// Values stay within `[lower_bound, upper_bound]` (code 0).
    #[default]
    Range,
    /// Values span a wide symmetric range, ignoring the bounds (code 1).
    Unbounded,
}

/// What `collect_data(n)` does with the buffer capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectPolicy {
    /// Read the most recent `n` samples; capacity is left alone.
    #[default]
    Decoupled,
    /// Resize the buffer capacity to `n` first, then return the whole buffer.
    Coupled,
}

impl FromStr for TimingMode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "aperiodic" | "asynchronous" => Ok(TimingMode::Aperiodic),
            "1" | "periodic" | "periodically" => Ok(TimingMode::Periodic),
            _ => Err("expected 0 (aperiodic) or 1 (periodic)"),
        }
    }
}

impl FromStr for ValueMode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "random" => Ok(ValueMode::Random),
            "1" | "deterministic" => Ok(ValueMode::Deterministic),
            _ => Err("expected 0 (random) or 1 (deterministic)"),
        }
    }
}

impl FromStr for LimitMode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "range" => Ok(LimitMode::Range),
            "1" | "unbounded" => Ok(LimitMode::Unbounded),
            _ => Err("expected 0 (range) or 1 (unbounded)"),
        }
    }
}

impl FromStr for CollectPolicy {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "decoupled" => Ok(CollectPolicy::Decoupled),
            "1" | "coupled" => Ok(CollectPolicy::Coupled),
            _ => Err("expected 0 (decoupled) or 1 (coupled)"),
        }
    }
}

impl fmt::Display for TimingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingMode::Aperiodic => write!(f, "Aperiodic"),
            TimingMode::Periodic => write!(f, "Periodic"),
        }
    }
}

impl fmt::Display for ValueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueMode::Random => write!(f, "Random"),
            ValueMode::Deterministic => write!(f, "Deterministic"),
        }
    }
}

impl fmt::Display for LimitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitMode::Range => write!(f, "Range"),
            LimitMode::Unbounded => write!(f, "Unbounded"),
        }
    }
}

impl fmt::Display for CollectPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectPolicy::Decoupled => write!(f, "Decoupled"),
            CollectPolicy::Coupled => write!(f, "Coupled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_factory_settings() {
        assert_eq!(TimingMode::default(), TimingMode::Periodic);
        assert_eq!(ValueMode::default(), ValueMode::Random);
        assert_eq!(LimitMode::default(), LimitMode::Range);
        assert_eq!(CollectPolicy::default(), CollectPolicy::Decoupled);
    }

    #[test]
    fn test_parse_numeric_codes() {
        assert_eq!("0".parse(), Ok(TimingMode::Aperiodic));
        assert_eq!("1".parse(), Ok(TimingMode::Periodic));
        assert_eq!("1".parse(), Ok(ValueMode::Deterministic));
        assert_eq!("1".parse(), Ok(LimitMode::Unbounded));
        assert!("2".parse::<TimingMode>().is_err());
    }

    #[test]
    fn test_parse_names_case_insensitive() {
        assert_eq!("Aperiodic".parse(), Ok(TimingMode::Aperiodic));
        assert_eq!("RANDOM".parse(), Ok(ValueMode::Random));
        assert_eq!(" range ".parse(), Ok(LimitMode::Range));
        assert_eq!("coupled".parse(), Ok(CollectPolicy::Coupled));
    }
}
