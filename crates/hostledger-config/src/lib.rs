//! # hostledger-config
//!
//! TOML settings for the hostledger runtime: proof-of-work difficulty, the
//! initial file scan scope, and poll/seal timer periods.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use hostledger_config::LedgerSettings;
//!
//! let settings = LedgerSettings::from_file(Path::new("hostledger.toml"))?;
//! let scope = ScanScope::new(settings.monitoring_config()?);
//! let handle = coordinator.start(&settings.to_schedule());
//! ```

pub mod loader;
pub mod settings;

pub use settings::{LedgerSettings, MonitoringSettings, ScheduleSettings, MAX_DIFFICULTY};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use hostledger_contracts::error::LedgerError;

    use crate::LedgerSettings;

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// Assert `toml` is rejected with a reason mentioning `needle`.
    fn assert_config_error(toml: &str, needle: &str) {
        match LedgerSettings::from_toml_str(toml) {
            Err(LedgerError::ConfigError { reason }) => {
                assert!(reason.contains(needle), "expected '{needle}' in reason, got: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    /// An empty document yields the defaults.
    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = LedgerSettings::from_toml_str("").unwrap();
        assert_eq!(settings, LedgerSettings::default());
        assert_eq!(settings.difficulty, 2);
        assert_eq!(settings.monitoring.excluded_dirs, vec![".git", "node_modules"]);

        let schedule = settings.to_schedule();
        assert_eq!(schedule.file_poll, Duration::from_secs(60));
        assert_eq!(schedule.network_poll, Duration::from_secs(30));
        assert_eq!(schedule.account_poll, Duration::from_secs(120));
        assert_eq!(schedule.seal_every, Duration::from_secs(30));
        assert_eq!(schedule.seal_offset, Duration::from_secs(5));
    }

    /// A partial table keeps defaults for the keys it omits.
    #[test]
    fn test_partial_schedule_keeps_other_defaults() {
        let toml = r#"
            [schedule]
            seal_secs = 10
        "#;

        let settings = LedgerSettings::from_toml_str(toml).unwrap();
        assert_eq!(settings.schedule.seal_secs, 10);
        assert_eq!(settings.schedule.file_poll_secs, 60);
    }

    #[test]
    fn test_full_document() {
        let toml = r#"
            difficulty = 3

            [monitoring]
            roots = ["/srv/app", " /opt/bin "]
            excluded_dirs = ["cache"]

            [schedule]
            file_poll_secs = 5
            network_poll_secs = 6
            account_poll_secs = 7
            seal_secs = 8
            seal_offset_secs = 0
        "#;

        let settings = LedgerSettings::from_toml_str(toml).unwrap();
        assert_eq!(settings.difficulty, 3);

        let scope = settings.monitoring_config().unwrap();
        assert_eq!(scope.roots, vec!["/srv/app", "/opt/bin"], "entries are trimmed");
        assert_eq!(scope.excluded_dirs, vec!["cache"]);

        let schedule = settings.to_schedule();
        assert_eq!(schedule.account_poll, Duration::from_secs(7));
        assert_eq!(schedule.seal_offset, Duration::ZERO);
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn test_difficulty_above_digest_length_rejected() {
        assert_config_error("difficulty = 65", "difficulty");
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert_config_error("[schedule]\nnetwork_poll_secs = 0", "schedule.network_poll_secs");
    }

    #[test]
    fn test_empty_roots_rejected() {
        assert_config_error("[monitoring]\nroots = []", "monitoring.roots");
    }

    #[test]
    fn test_blank_excluded_entry_rejected() {
        assert_config_error(
            "[monitoring]\nroots = [\"/etc\"]\nexcluded_dirs = [\".git\", \"  \"]",
            "monitoring.excluded_dirs[1]",
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert_config_error("dificulty = 2", "failed to parse");
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert_config_error("difficulty = ", "failed to parse");
    }

    // ── Files ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "difficulty = 1").unwrap();

        let settings = LedgerSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.difficulty, 1);
    }

    #[test]
    fn test_missing_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = LedgerSettings::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(LedgerError::ConfigError { .. })));
    }
}
