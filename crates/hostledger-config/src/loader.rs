//! Loading, validation, and conversion into runtime types.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use hostledger_contracts::{
    error::{LedgerError, LedgerResult},
    monitoring::MonitoringConfig,
};
use hostledger_core::Schedule;

use crate::settings::{LedgerSettings, MAX_DIFFICULTY};

impl LedgerSettings {
    /// Parse `s` as TOML and validate the result.
    ///
    /// Returns `LedgerError::ConfigError` if the TOML is malformed, carries
    /// unknown keys, or fails validation.
    pub fn from_toml_str(s: &str) -> LedgerResult<Self> {
        let settings: LedgerSettings = toml::from_str(s).map_err(|e| LedgerError::ConfigError {
            reason: format!("failed to parse settings TOML: {}", e),
        })?;
        settings.validate()?;
        debug!(difficulty = settings.difficulty, roots = ?settings.monitoring.roots, "settings loaded");
        Ok(settings)
    }

    /// Read the file at `path` and parse it as settings TOML.
    pub fn from_file(path: &Path) -> LedgerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| LedgerError::ConfigError {
            reason: format!("failed to read settings file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check every value; the error names the offending key.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::ConfigError {
                reason: format!(
                    "difficulty must be between 0 and {MAX_DIFFICULTY}, got {}",
                    self.difficulty
                ),
            });
        }

        let schedule = &self.schedule;
        for (key, value) in [
            ("file_poll_secs", schedule.file_poll_secs),
            ("network_poll_secs", schedule.network_poll_secs),
            ("account_poll_secs", schedule.account_poll_secs),
            ("seal_secs", schedule.seal_secs),
        ] {
            if value == 0 {
                return Err(LedgerError::ConfigError {
                    reason: format!("schedule.{key} must be greater than 0"),
                });
            }
        }

        self.monitoring_config().map(|_| ())
    }

    /// The validated initial scan scope.
    pub fn monitoring_config(&self) -> LedgerResult<MonitoringConfig> {
        MonitoringConfig::new(
            self.monitoring.roots.clone(),
            self.monitoring.excluded_dirs.clone(),
        )
        .map_err(|err| match err {
            LedgerError::Validation { field, reason } => LedgerError::ConfigError {
                reason: format!(
                    "monitoring.{}: {reason}",
                    field.replacen("excludedDirs", "excluded_dirs", 1)
                ),
            },
            other => other,
        })
    }

    /// Timer periods for `EventCoordinator::start`.
    pub fn to_schedule(&self) -> Schedule {
        let s = &self.schedule;
        Schedule {
            file_poll: Duration::from_secs(s.file_poll_secs),
            network_poll: Duration::from_secs(s.network_poll_secs),
            account_poll: Duration::from_secs(s.account_poll_secs),
            seal_every: Duration::from_secs(s.seal_secs),
            seal_offset: Duration::from_secs(s.seal_offset_secs),
        }
    }
}
