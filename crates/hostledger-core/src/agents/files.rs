//! File-integrity agent: content digests of files under the scan roots.
//!
//! New files and content changes are reported one event per file. Files
//! that disappear are not reported. A file that cannot be read yields a
//! `file_integrity_error` and keeps its previous digest in the baseline, so
//! it is compared against its last good content once readable again.

use serde_json::json;

use hostledger_contracts::{
    domain::Domain,
    event::{Event, Severity},
    snapshot::FileSnapshot,
};

use super::{details_from, BaselineDiffAgent, DiffPolicy};
use crate::diff::diff_maps;

pub const FILE_INTEGRITY_BASELINE: &str = "file_integrity_baseline";
pub const FILE_INTEGRITY_ADDED: &str = "file_integrity_added";
pub const FILE_INTEGRITY_CHANGE: &str = "file_integrity_change";
pub const FILE_INTEGRITY_ERROR: &str = "file_integrity_error";

pub struct FileIntegrity;

pub type FileIntegrityAgent = BaselineDiffAgent<FileIntegrity>;

impl DiffPolicy for FileIntegrity {
    type Snapshot = FileSnapshot;

    const DOMAIN: Domain = Domain::Files;
    const SOURCE: &'static str = "file-integrity-agent";
    const CHECK_ERROR: &'static str = "file_integrity_check_error";

    fn has_baseline(baseline: &FileSnapshot) -> bool {
        !baseline.digests.is_empty()
    }

    fn collection_errors(current: &FileSnapshot) -> Vec<Event> {
        current
            .unreadable
            .iter()
            .map(|(path, error)| {
                Event::new(
                    FILE_INTEGRITY_ERROR,
                    Self::SOURCE,
                    Severity::High,
                    format!("Unable to read file: {path}"),
                    details_from(json!({ "path": path, "error": error })),
                )
            })
            .collect()
    }

    fn baseline_event(current: &FileSnapshot) -> Event {
        Event::new(
            FILE_INTEGRITY_BASELINE,
            Self::SOURCE,
            Severity::Info,
            format!("File integrity baseline recorded for {} files", current.digests.len()),
            details_from(json!({ "files": current.digests })),
        )
    }

    fn diff_events(baseline: &FileSnapshot, current: &FileSnapshot) -> Vec<Event> {
        let diff = diff_maps(&baseline.digests, &current.digests);

        let added = diff.added.into_iter().map(|path| {
            let hash = current.digests.get(&path).cloned().unwrap_or_default();
            Event::new(
                FILE_INTEGRITY_ADDED,
                Self::SOURCE,
                Severity::Medium,
                format!("New file detected: {path}"),
                details_from(json!({ "path": path, "hash": hash })),
            )
        });

        let changed = diff.changed.into_iter().map(|change| {
            Event::new(
                FILE_INTEGRITY_CHANGE,
                Self::SOURCE,
                Severity::High,
                format!("File content changed: {}", change.key),
                details_from(json!({
                    "path": change.key,
                    "oldHash": change.old,
                    "newHash": change.new,
                })),
            )
        });

        added.chain(changed).collect()
    }

    fn next_baseline(previous: FileSnapshot, current: FileSnapshot) -> FileSnapshot {
        let FileSnapshot { mut digests, unreadable } = current;
        // An unreadable entry may be a directory: keep every old digest at or
        // beneath it.
        for (path, old) in previous.digests {
            if unreadable.keys().any(|dir| is_within(&path, dir)) {
                digests.entry(path).or_insert(old);
            }
        }
        FileSnapshot {
            digests,
            unreadable: Default::default(),
        }
    }
}

/// Whether `path` is `entry` itself or lies beneath it.
fn is_within(path: &str, entry: &str) -> bool {
    match path.strip_prefix(entry) {
        Some("") => true,
        Some(rest) => rest.starts_with(['/', '\\']) || entry.ends_with(['/', '\\']),
        None => false,
    }
}
