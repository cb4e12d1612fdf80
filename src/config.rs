//! Tunable parameters of a report run.
//!
//! Values are resolved in increasing order of precedence: built-in defaults,
//! environment variables (a `.env` file is loaded by the binary), an optional
//! JSON file, and finally command-line flags applied by the caller.
//!
//! ```json
//! {
//!   "departure_bin_minutes": 15,
//!   "weekly_bin_ms": 604800000
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DEPARTURE_BIN_MINUTES: i64 = 10;
pub const DEFAULT_WEEKLY_BIN_MS: i64 = 1000 * 60 * 60 * 24 * 7;

pub const ENV_DEPARTURE_BIN_MINUTES: &str = "FLIGHT_REPORT_DEPARTURE_BIN_MINUTES";
pub const ENV_WEEKLY_BIN_MS: &str = "FLIGHT_REPORT_WEEKLY_BIN_MS";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got {value}")]
    NonPositiveWidth { name: &'static str, value: i64 },

    #[error("{name}={value} is not an integer")]
    NotAnInteger { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Bucket width of the departure-time-of-day histograms, in minutes.
    pub departure_bin_minutes: i64,
    /// Bucket width of the departure timestamp histograms, in milliseconds.
    pub weekly_bin_ms: i64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            departure_bin_minutes: DEFAULT_DEPARTURE_BIN_MINUTES,
            weekly_bin_ms: DEFAULT_WEEKLY_BIN_MS,
        }
    }
}

impl ReportConfig {
    /// Defaults overridden by whichever environment variables are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ReportConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = lookup(ENV_DEPARTURE_BIN_MINUTES) {
            config.departure_bin_minutes = parse_int(ENV_DEPARTURE_BIN_MINUTES, &v)?;
        }
        if let Some(v) = lookup(ENV_WEEKLY_BIN_MS) {
            config.weekly_bin_ms = parse_int(ENV_WEEKLY_BIN_MS, &v)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads the config from a JSON file at `path`. Missing keys keep their
    /// defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{path}'"))?;
        let config: ReportConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file '{path}'"))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies command-line overrides on top of `self`.
    pub fn with_overrides(
        mut self,
        departure_bin_minutes: Option<i64>,
        weekly_bin_ms: Option<i64>,
    ) -> Result<Self, ConfigError> {
        if let Some(v) = departure_bin_minutes {
            self.departure_bin_minutes = v;
        }
        if let Some(v) = weekly_bin_ms {
            self.weekly_bin_ms = v;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.departure_bin_minutes <= 0 {
            return Err(ConfigError::NonPositiveWidth {
                name: "departure_bin_minutes",
                value: self.departure_bin_minutes,
            });
        }
        if self.weekly_bin_ms <= 0 {
            return Err(ConfigError::NonPositiveWidth {
                name: "weekly_bin_ms",
                value: self.weekly_bin_ms,
            });
        }
        Ok(())
    }
}

fn parse_int(name: &'static str, value: &str) -> Result<i64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::NotAnInteger {
        name,
        value: value.to_string(),
    })
}
