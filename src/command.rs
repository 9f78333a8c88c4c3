//! Line-oriented command surface.
//!
//! ```text
//! set <property> <value>
//! start | stop | status | help | exit
//! ```
//!
//! Parsing only splits and classifies the line; values are validated by the
//! component that owns the property.

use crate::error::{AppResult, DaqError};
use std::str::FromStr;

/// Which component owns a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// The simulated sensor
    Sensor,
    /// The sliding-window processor
    Processor,
    /// The polling loop
    Orchestrator,
}

impl Component {
    /// Owner of a `set` property, if it is one we know.
    pub fn for_property(property: &str) -> Option<Self> {
        match property {
            "timing" | "valuetype" | "limit" | "upperbound" | "lowerbound" | "period"
            | "minperiod" | "maxperiod" | "databuffersize" | "collectpolicy" => {
                Some(Component::Sensor)
            }
            "filtertype" | "filtersize" | "numberofdatapoints" | "filtergranularity"
            | "subsetblocksize" => Some(Component::Processor),
            "pollingrate" | "collectsize" | "printdata" => Some(Component::Orchestrator),
            _ => None,
        }
    }
}

/// One parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Change a property
    Set {
        /// Lowercased property name
        property: String,
        /// Raw value text
        value: String,
    },
    /// Start sample generation and polling
    Start,
    /// Stop sample generation and polling
    Stop,
    /// Print the current configuration
    Status,
    /// Print the command reference
    Help,
    /// Leave the command loop
    Exit,
}

impl FromStr for Command {
    type Err = DaqError;

    fn from_str(line: &str) -> AppResult<Self> {
        let mut words = line.split_whitespace();
        let action = words.next().unwrap_or_default().to_ascii_lowercase();
        match action.as_str() {
            "set" => {
                let property = words
                    .next()
                    .ok_or_else(|| DaqError::invalid("set", "missing property name"))?
                    .to_ascii_lowercase();
                let value = words
                    .next()
                    .ok_or_else(|| DaqError::invalid(property.clone(), "missing value"))?
                    .to_string();
                Ok(Command::Set { property, value })
            }
            "start" => Ok(Command::Start),
            "stop" => Ok(Command::Stop),
            "status" => Ok(Command::Status),
            "help" => Ok(Command::Help),
            "exit" | "quit" => Ok(Command::Exit),
            "" => Err(DaqError::invalid("command", "empty command")),
            other => Err(DaqError::invalid("command", format!("unknown command: {other}"))),
        }
    }
}

/// Command reference printed by `help`.
pub const HELP_TEXT: &str = "\
Commands:
  start                         start sample generation and polling
  stop                          stop sample generation and polling
  status                        show the current configuration
  exit                          leave the program
  set <property> <value>        change a setting

Sensor properties:
  timing <0|1>                  0 aperiodic, 1 periodic
  valuetype <0|1>               0 random, 1 deterministic
  limit <0|1>                   0 range, 1 unbounded
  lowerbound <n> / upperbound <n>
  period <ms> / minperiod <ms> / maxperiod <ms>
  databuffersize <n>
  collectpolicy <0|1>           0 decoupled, 1 coupled

Processor properties:
  filtertype <0|1>              0 none, 1 moving average
  filtersize <n>                0 < n < numberofdatapoints
  numberofdatapoints <n>        window capacity, resets history
  filtergranularity <0|1>       0 per batch, 1 per sample
  subsetblocksize <n>

Polling properties:
  pollingrate <ms>              0 < ms < 10000
  collectsize <n>               0 < n < 1000
  printdata <0|1>
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set() {
        let cmd: Command = "set Period 250".parse().unwrap();
        assert_eq!(
            cmd,
            Command::Set {
                property: "period".to_string(),
                value: "250".to_string()
            }
        );
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!("start".parse::<Command>().unwrap(), Command::Start);
        assert_eq!("  STOP ".parse::<Command>().unwrap(), Command::Stop);
        assert_eq!("help".parse::<Command>().unwrap(), Command::Help);
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Exit);
    }

    #[test]
    fn test_parse_errors_are_rejections() {
        for line in ["", "set", "set period", "launch"] {
            let err = line.parse::<Command>().unwrap_err();
            assert!(err.is_rejection(), "{line:?} should be a rejection");
        }
    }

    #[test]
    fn test_property_owners() {
        assert_eq!(Component::for_property("period"), Some(Component::Sensor));
        assert_eq!(
            Component::for_property("filtersize"),
            Some(Component::Processor)
        );
        assert_eq!(
            Component::for_property("printdata"),
            Some(Component::Orchestrator)
        );
        assert_eq!(Component::for_property("gain"), None);
    }
}
