//! Engine configuration.
//!
//! Configuration only sets defaults for newly created ports; it never
//! describes a circuit.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CircuitError, CircuitResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial auto-propagate flag of every new output.
    pub auto_propagate: bool,
    /// Initial always-notify flag of every new output. Off means
    /// republishing an unchanged value is suppressed.
    pub always_notify: bool,
    /// Emit a trace event on every tick enter/leave.
    pub trace_ticks: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_propagate: true,
            always_notify: false,
            trace_ticks: false,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> CircuitResult<Self> {
        serde_yaml::from_str(text).map_err(|e| CircuitError::Config {
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> CircuitResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CircuitError::Config {
            message: format!("{}: {e}", path.display()),
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn with_always_notify(mut self, always_notify: bool) -> Self {
        self.always_notify = always_notify;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_suppress_unchanged_values() {
        let config = EngineConfig::default();
        assert!(config.auto_propagate);
        assert!(!config.always_notify);
    }

    #[test]
    fn yaml_fills_missing_fields() {
        let config = EngineConfig::from_yaml_str("always_notify: true\n").unwrap();
        assert!(config.always_notify);
        assert!(config.auto_propagate);
        assert!(!config.trace_ticks);
    }

    #[test]
    fn bad_yaml_is_config_error() {
        let err = EngineConfig::from_yaml_str("always_notify: [").unwrap_err();
        assert!(matches!(err, CircuitError::Config { .. }));
    }
}
