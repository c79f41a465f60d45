//! Scan scope for the file-integrity agent.
//!
//! The scope is runtime-mutable: `set_roots` and `set_excluded_dirs` replace
//! a list only after every entry has been validated, so a rejected update
//! leaves the previous value in place.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Which directories the file-integrity agent walks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringConfig {
    /// Directories walked recursively on every file poll.
    pub roots: Vec<String>,

    /// Directory *names* (not paths) skipped wherever they appear.
    #[serde(default)]
    pub excluded_dirs: Vec<String>,
}

impl MonitoringConfig {
    /// Build a validated scope.
    pub fn new(roots: Vec<String>, excluded_dirs: Vec<String>) -> LedgerResult<Self> {
        Ok(Self {
            roots: validate_entries("roots", roots, true)?,
            excluded_dirs: validate_entries("excludedDirs", excluded_dirs, false)?,
        })
    }

    /// Replace the roots. Requires at least one non-blank entry.
    pub fn set_roots(&mut self, roots: Vec<String>) -> LedgerResult<()> {
        self.roots = validate_entries("roots", roots, true)?;
        Ok(())
    }

    /// Replace the excluded directory names. An empty list is allowed.
    pub fn set_excluded_dirs(&mut self, excluded: Vec<String>) -> LedgerResult<()> {
        self.excluded_dirs = validate_entries("excludedDirs", excluded, false)?;
        Ok(())
    }

    /// Whether a directory with this file name is skipped by the walker.
    pub fn is_excluded(&self, dir_name: &str) -> bool {
        self.excluded_dirs.iter().any(|d| d == dir_name)
    }
}

/// Trim every entry and reject blanks.
///
/// `require_one` additionally rejects an empty list.
fn validate_entries(field: &str, entries: Vec<String>, require_one: bool) -> LedgerResult<Vec<String>> {
    if require_one && entries.is_empty() {
        return Err(LedgerError::validation(field, "at least one entry is required"));
    }

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let trimmed = entry.trim();
            if trimmed.is_empty() {
                Err(LedgerError::validation(
                    format!("{field}[{i}]"),
                    "entries must not be empty or whitespace",
                ))
            } else {
                Ok(trimmed.to_string())
            }
        })
        .collect()
}
