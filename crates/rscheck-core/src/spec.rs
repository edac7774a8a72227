use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::probe::ProbeKind;

/// Configuration for one probe — spec.md §3's CheckSpec.
///
/// `name` is not part of the YAML object itself (it's the map key under
/// `threads:`); the config loader fills it in after deserializing the
/// rest of the fields.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckSpec {
    #[serde(skip)]
    pub name: String,

    #[serde(rename = "interval", default = "default_interval_secs")]
    interval_secs: f64,

    #[serde(rename = "timeout", default = "default_timeout_secs")]
    timeout_secs: f64,

    #[serde(default = "default_true")]
    pub error_message: bool,

    #[serde(default)]
    pub status_message: bool,

    #[serde(flatten)]
    pub kind: ProbeKind,
}

fn default_interval_secs() -> f64 {
    3.0
}

fn default_timeout_secs() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl CheckSpec {
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs <= 0.0 {
            return Err(ConfigError::InvalidDuration(format!(
                "check {:?}: interval must be positive, got {}",
                self.name, self.interval_secs
            )));
        }
        if self.timeout_secs <= 0.0 {
            return Err(ConfigError::InvalidDuration(format!(
                "check {:?}: timeout must be positive, got {}",
                self.name, self.timeout_secs
            )));
        }
        Ok(())
    }
}
