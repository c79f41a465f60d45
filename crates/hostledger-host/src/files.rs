//! Filesystem snapshot: SHA-256 of every regular file under the scan roots.
//!
//! Walk rules:
//!
//! - Roots are read from the shared [`ScanScope`] at the start of every
//!   snapshot, so scope changes apply from the next poll.
//! - A root that is missing or cannot be listed fails the whole snapshot.
//! - Directories whose *name* is excluded are skipped at any depth.
//! - A symlink to a file is hashed; a symlink to a directory is not followed.
//! - Sockets, FIFOs and devices are skipped; reading them could block.
//! - An entry beneath a root that cannot be listed or read is recorded in
//!   `FileSnapshot::unreadable` and the walk continues.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use hostledger_contracts::{
    error::{LedgerError, LedgerResult},
    monitoring::MonitoringConfig,
    snapshot::FileSnapshot,
};
use hostledger_core::{traits::SnapshotSource, ScanScope};

const SOURCE_NAME: &str = "filesystem";

/// Hashes the files under the current scan scope.
#[derive(Debug, Clone)]
pub struct FsHashSource {
    scope: ScanScope,
}

impl FsHashSource {
    pub fn new(scope: ScanScope) -> Self {
        Self { scope }
    }
}

impl SnapshotSource<FileSnapshot> for FsHashSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn snapshot(&self) -> LedgerResult<FileSnapshot> {
        let config = self.scope.current();
        let mut snapshot = FileSnapshot::default();

        for root in &config.roots {
            let root_path = std::path::absolute(root).map_err(|e| root_error(root, &e))?;
            let metadata = fs::metadata(&root_path).map_err(|e| root_error(root, &e))?;

            if metadata.is_dir() {
                let entries = fs::read_dir(&root_path).map_err(|e| root_error(root, &e))?;
                walk_entries(&root_path, entries, &config, &mut snapshot);
            } else {
                record_file(&root_path, &mut snapshot);
            }
        }

        debug!(
            files = snapshot.digests.len(),
            unreadable = snapshot.unreadable.len(),
            "filesystem snapshot complete"
        );
        Ok(snapshot)
    }
}

fn root_error(root: &str, err: &io::Error) -> LedgerError {
    LedgerError::collection(SOURCE_NAME, format!("scan root '{root}' is not accessible: {err}"))
}

/// Lowercase hex SHA-256 of the file at `path`, streamed.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

fn walk_dir(dir: &Path, config: &MonitoringConfig, snapshot: &mut FileSnapshot) {
    match fs::read_dir(dir) {
        Ok(entries) => walk_entries(dir, entries, config, snapshot),
        Err(err) => mark_unreadable(dir, &err, snapshot),
    }
}

fn walk_entries(
    dir: &Path,
    entries: fs::ReadDir,
    config: &MonitoringConfig,
    snapshot: &mut FileSnapshot,
) {
    for entry in entries {
        match entry {
            Ok(entry) => visit(entry.path(), config, snapshot),
            Err(err) => mark_unreadable(dir, &err, snapshot),
        }
    }
}

fn visit(path: PathBuf, config: &MonitoringConfig, snapshot: &mut FileSnapshot) {
    let metadata = match fs::symlink_metadata(&path) {
        Ok(metadata) => metadata,
        Err(err) => return mark_unreadable(&path, &err, snapshot),
    };

    let file_type = metadata.file_type();
    if file_type.is_dir() {
        let excluded = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| config.is_excluded(name));
        if !excluded {
            walk_dir(&path, config, snapshot);
        }
    } else if file_type.is_file() {
        record_file(&path, snapshot);
    } else if file_type.is_symlink() {
        match fs::metadata(&path) {
            Ok(target) if target.is_file() => record_file(&path, snapshot),
            Ok(_) => {}
            Err(err) => mark_unreadable(&path, &err, snapshot),
        }
    }
}

fn record_file(path: &Path, snapshot: &mut FileSnapshot) {
    match hash_file(path) {
        Ok(digest) => {
            snapshot.digests.insert(path.display().to_string(), digest);
        }
        Err(err) => mark_unreadable(path, &err, snapshot),
    }
}

fn mark_unreadable(path: &Path, err: &io::Error, snapshot: &mut FileSnapshot) {
    warn!(path = %path.display(), error = %err, "unable to read entry");
    snapshot
        .unreadable
        .insert(path.display().to_string(), err.to_string());
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use hostledger_contracts::{error::LedgerError, monitoring::MonitoringConfig};
    use hostledger_core::{traits::SnapshotSource, ScanScope};

    use super::{hash_file, FsHashSource};

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// SHA-256 of "hello".
    const HELLO_DIGEST: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    fn scope_for(root: &Path, excluded: &[&str]) -> ScanScope {
        let config = MonitoringConfig::new(
            vec![root.display().to_string()],
            excluded.iter().map(|s| s.to_string()).collect(),
        )
        .unwrap();
        ScanScope::new(config)
    }

    fn key(path: &Path) -> String {
        std::path::absolute(path).unwrap().display().to_string()
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_hash_file_matches_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "hello").unwrap();

        assert_eq!(hash_file(&path).unwrap(), HELLO_DIGEST);
    }

    /// Nested files are found; excluded directory names are skipped at any depth.
    #[test]
    fn test_walk_recurses_and_skips_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("conf/nested")).unwrap();
        fs::create_dir_all(root.join("conf/.git")).unwrap();
        fs::write(root.join("top.txt"), "hello").unwrap();
        fs::write(root.join("conf/nested/deep.txt"), "deep").unwrap();
        fs::write(root.join("conf/.git/HEAD"), "ref").unwrap();

        let snapshot = FsHashSource::new(scope_for(root, &[".git"])).snapshot().unwrap();

        assert_eq!(snapshot.digests.len(), 2, "got {:?}", snapshot.digests.keys());
        assert_eq!(snapshot.digests[&key(&root.join("top.txt"))], HELLO_DIGEST);
        assert!(snapshot.digests.contains_key(&key(&root.join("conf/nested/deep.txt"))));
        assert!(snapshot.unreadable.is_empty());
    }

    #[test]
    fn test_missing_root_fails_whole_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");

        match FsHashSource::new(scope_for(&missing, &[])).snapshot() {
            Err(LedgerError::Collection { source_name, reason }) => {
                assert_eq!(source_name, "filesystem");
                assert!(reason.contains("absent"), "reason should name the root: {reason}");
            }
            other => panic!("expected Collection error, got {:?}", other),
        }
    }

    /// A root may name a single file.
    #[test]
    fn test_file_root_is_hashed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts");
        fs::write(&path, "hello").unwrap();

        let snapshot = FsHashSource::new(scope_for(&path, &[])).snapshot().unwrap();
        assert_eq!(snapshot.digests[&key(&path)], HELLO_DIGEST);
    }

    /// Scope changes are picked up by the next snapshot.
    #[test]
    fn test_scope_change_applies_to_next_snapshot() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join("one"), "1").unwrap();
        fs::write(second.path().join("two"), "2").unwrap();

        let scope = scope_for(first.path(), &[]);
        let source = FsHashSource::new(scope.clone());
        assert!(source.snapshot().unwrap().digests.contains_key(&key(&first.path().join("one"))));

        scope.set_roots(vec![second.path().display().to_string()]).unwrap();
        let snapshot = source.snapshot().unwrap();
        assert_eq!(snapshot.digests.len(), 1);
        assert!(snapshot.digests.contains_key(&key(&second.path().join("two"))));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let outside = dir.path().join("outside");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join("secret"), "x").unwrap();
        fs::write(root.join("real"), "hello").unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("alias")).unwrap();

        let snapshot = FsHashSource::new(scope_for(&root, &[])).snapshot().unwrap();

        assert!(snapshot.digests.contains_key(&key(&root.join("alias"))), "file symlinks are hashed");
        assert!(!snapshot.digests.keys().any(|k| k.ends_with("secret")));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();

        let snapshot = FsHashSource::new(scope_for(dir.path(), &[])).snapshot().unwrap();
        assert!(snapshot.unreadable.contains_key(&key(&dir.path().join("dangling"))));
    }
}
