//! Runtime configuration.
//!
//! Everything has a default; a TOML file can override any subset of the
//! fields. Intervals are validated up front so a zero period never
//! reaches the scheduler.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Tunable settings for every process role.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// OS id of the shared block. All cooperating processes must agree on
    /// it; changing the layout means changing the name.
    pub block_name: String,
    /// Journal file appended to by every participant.
    pub journal_path: PathBuf,
    /// Counter increment cadence, milliseconds.
    pub increment_interval_ms: u64,
    /// Main's journal report cadence, milliseconds.
    pub report_interval_ms: u64,
    /// Worker spawn-check cadence, milliseconds.
    pub spawn_interval_ms: u64,
    /// How long role B holds the doubled counter before compensating,
    /// milliseconds. May be zero (tests use that).
    pub worker_hold_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            block_name: "herd_state".to_owned(),
            journal_path: PathBuf::from("herd.log"),
            increment_interval_ms: 300,
            report_interval_ms: 1000,
            spawn_interval_ms: 3000,
            worker_hold_ms: 2000,
        }
    }
}

impl Config {
    /// Defaults, overridden by the TOML file at `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.block_name.is_empty() {
            return Err(Error::Config {
                reason: "block_name must not be empty".to_owned(),
            });
        }
        let intervals = [
            ("increment_interval_ms", self.increment_interval_ms),
            ("report_interval_ms", self.report_interval_ms),
            ("spawn_interval_ms", self.spawn_interval_ms),
        ];
        for (field, value) in intervals {
            if value == 0 {
                return Err(Error::Config {
                    reason: format!("{field} must be > 0"),
                });
            }
        }
        Ok(())
    }

    pub fn increment_interval(&self) -> Duration {
        Duration::from_millis(self.increment_interval_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    pub fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }

    pub fn worker_hold(&self) -> Duration {
        Duration::from_millis(self.worker_hold_ms)
    }
}
