//! Custom error types for the application.
//!
//! This module defines the primary error type, `DaqError`, for the whole crate.
//! Using the `thiserror` crate, it provides one consistent way to report the
//! few things that can go wrong in a simulated acquisition pipeline.
//!
//! ## Error Hierarchy
//!
//! - **`Config`**: Wraps errors from `figment`, typically parsing or type errors in the
//!   configuration file or in `SENSOR_DAQ_` environment overrides.
//! - **`Configuration`**: Semantic errors in a loaded configuration (values that parse
//!   but break an invariant, such as `lower_bound >= upper_bound`).
//! - **`InvalidSetting`**: A runtime setter declined a change. State is left untouched
//!   and the reason travels back to the caller as data.
//! - **`UnknownOption`**: A `configure` call named an option the component does not have.
//! - **`FeatureIncomplete`**: A recognized but unimplemented option value, e.g. a
//!   placeholder filter kind.
//! - **`GenerationAlreadyRunning`** / **`GenerationNotRunning`**: lifecycle misuse of the
//!   sample generation task.
//! - **`Io`**: Wraps `std::io::Error` from the interactive command loop.
//! - **`Processing`**: Errors raised while joining or driving background tasks.
//!
//! None of these are fatal to the pipeline. Rejections are reported and the
//! process continues; see [`DaqError::is_rejection`].

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, DaqError>;

#[derive(Error, Debug)]
pub enum DaqError {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("Invalid value for '{option}': {reason}")]
    InvalidSetting { option: String, reason: String },

    #[error("Unknown {component} option: {option}")]
    UnknownOption { component: String, option: String },

    #[error("Feature '{0}' is recognized but not yet implemented. {1}")]
    FeatureIncomplete(String, String),

    #[error("Sample generation is already running")]
    GenerationAlreadyRunning,

    #[error("Sample generation is not running")]
    GenerationNotRunning,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data processing error: {0}")]
    Processing(String),
}

impl DaqError {
    /// Build an `InvalidSetting` from a validator message.
    pub fn invalid(option: impl Into<String>, reason: impl Into<String>) -> Self {
        DaqError::InvalidSetting {
            option: option.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for errors that only mean "the request was declined".
    ///
    /// The command surface prints these and keeps going; anything else is an
    /// operational failure worth surfacing further.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            DaqError::InvalidSetting { .. }
                | DaqError::UnknownOption { .. }
                | DaqError::FeatureIncomplete(..)
                | DaqError::GenerationAlreadyRunning
                | DaqError::GenerationNotRunning
                | DaqError::Configuration(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_setting_carries_option_and_reason() {
        let err = DaqError::invalid("period", "must be greater than 0");
        assert_eq!(
            err.to_string(),
            "Invalid value for 'period': must be greater than 0"
        );
        assert!(err.is_rejection());
    }

    #[test]
    fn io_errors_are_not_rejections() {
        let err: DaqError = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert!(!err.is_rejection());
    }

    #[test]
    fn unknown_option_message_names_component() {
        let err = DaqError::UnknownOption {
            component: "sensor".into(),
            option: "gain".into(),
        };
        assert_eq!(err.to_string(), "Unknown sensor option: gain");
    }
}
