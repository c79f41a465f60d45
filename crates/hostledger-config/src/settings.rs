//! Settings types and their defaults.
//!
//! Every key is optional. A missing table or key falls back to the defaults
//! below; unknown keys are rejected so a typo is not silently ignored.
//!
//! Example:
//! ```toml
//! difficulty = 2
//!
//! [monitoring]
//! roots = ["/etc"]
//! excluded_dirs = [".git", "node_modules"]
//!
//! [schedule]
//! file_poll_secs = 60
//! network_poll_secs = 30
//! account_poll_secs = 120
//! seal_secs = 30
//! seal_offset_secs = 5
//! ```

use serde::{Deserialize, Serialize};

/// Highest accepted difficulty: a SHA-256 hex digest has 64 characters.
pub const MAX_DIFFICULTY: usize = 64;

/// Top-level settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerSettings {
    /// Leading `'0'` hex characters required of every sealed block hash.
    pub difficulty: usize,

    pub monitoring: MonitoringSettings,

    pub schedule: ScheduleSettings,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            difficulty: 2,
            monitoring: MonitoringSettings::default(),
            schedule: ScheduleSettings::default(),
        }
    }
}

/// Initial scan scope of the file-integrity agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitoringSettings {
    pub roots: Vec<String>,

    /// Directory names skipped wherever they appear under a root.
    pub excluded_dirs: Vec<String>,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            roots: default_roots(),
            excluded_dirs: vec![".git".to_string(), "node_modules".to_string()],
        }
    }
}

#[cfg(windows)]
fn default_roots() -> Vec<String> {
    vec![r"C:\Windows\System32\drivers\etc".to_string()]
}

#[cfg(not(windows))]
fn default_roots() -> Vec<String> {
    vec!["/etc".to_string()]
}

/// Timer periods, in whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleSettings {
    pub file_poll_secs: u64,
    pub network_poll_secs: u64,
    pub account_poll_secs: u64,
    pub seal_secs: u64,

    /// Delay before the first seal; may be 0.
    pub seal_offset_secs: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            file_poll_secs: 60,
            network_poll_secs: 30,
            account_poll_secs: 120,
            seal_secs: 30,
            seal_offset_secs: 5,
        }
    }
}
