//! Small validators shared by the runtime setters and `PipelineConfig::validate`.
//!
//! Each returns `Ok(())` or a static message; callers wrap the message into
//! [`DaqError::InvalidSetting`](crate::error::DaqError::InvalidSetting) with the
//! option name attached.

use crate::error::{AppResult, DaqError};
use std::ops::Range;

/// Validates that a count (capacity, batch size, window size) is not zero.
///
/// # Returns
///
/// * `Ok(())` if the count is at least 1.
/// * `Err(&'static str)` otherwise.
pub fn is_positive_count(value: usize) -> Result<(), &'static str> {
    if value > 0 {
        Ok(())
    } else {
        Err("must be greater than 0")
    }
}

/// Validates that a duration in milliseconds is not zero.
pub fn is_positive_millis(value: u64) -> Result<(), &'static str> {
    if value > 0 {
        Ok(())
    } else {
        Err("must be greater than 0 ms")
    }
}

/// Validates that `lower < upper`.
///
/// NaN on either side fails, since it compares false against everything.
///
/// # Arguments
///
/// * `lower` - The value that must be strictly smaller.
/// * `upper` - The value that must be strictly larger.
pub fn is_strictly_ordered<T: PartialOrd>(lower: T, upper: T) -> Result<(), &'static str> {
    if lower < upper {
        Ok(())
    } else {
        Err("lower value must be strictly less than upper value")
    }
}

/// Validates that a value lies in a half-open range.
pub fn is_in_range<T: PartialOrd>(value: T, range: Range<T>) -> Result<(), &'static str> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err("value is outside the allowed range")
    }
}

/// Validates that a floating point value is finite.
pub fn is_finite(value: f64) -> Result<(), &'static str> {
    if value.is_finite() {
        Ok(())
    } else {
        Err("must be a finite number")
    }
}

/// Parse a command value, turning the parse error into a rejection.
pub fn parse_value<T>(option: &str, value: &str) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| DaqError::invalid(option, format!("'{value}': {e}")))
}
