//! Local account snapshot.
//!
//! Windows reads `net user` and `net localgroup administrators`; Linux reads
//! `/etc/passwd` and the member lists of the `sudo`, `wheel` and `admin`
//! groups in `/etc/group`. Both lists are collected in the same snapshot, and
//! either one failing fails the whole snapshot.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use hostledger_contracts::{
    error::{LedgerError, LedgerResult},
    snapshot::AccountSnapshot,
};
use hostledger_core::traits::SnapshotSource;

use crate::command::CommandRunner;

/// Groups whose members count as administrators on Linux.
pub const LINUX_ADMIN_GROUPS: [&str; 3] = ["sudo", "wheel", "admin"];

const NET_SEPARATOR: &str = "-----";
const NET_COMPLETED: &str = "The command completed";

// ── Decoders ──────────────────────────────────────────────────────────────────

/// Decode `net user`: whitespace-separated names between the dashed rule and
/// the completion line.
pub fn parse_net_user(output: &str) -> LedgerResult<BTreeSet<String>> {
    Ok(net_body(output, "net user")?
        .iter()
        .flat_map(|line| line.split_whitespace())
        .map(str::to_string)
        .collect())
}

/// Decode `net localgroup <group>`: one member per line (names may contain
/// spaces, e.g. `CORP\Domain Admins`).
pub fn parse_localgroup_members(output: &str) -> LedgerResult<BTreeSet<String>> {
    Ok(net_body(output, "net localgroup")?
        .iter()
        .map(|line| line.trim().to_string())
        .collect())
}

/// Non-blank lines between the dashed rule and the completion line.
fn net_body<'a>(output: &'a str, tool: &str) -> LedgerResult<Vec<&'a str>> {
    let mut lines = output.lines();
    if !lines.any(|line| line.trim_start().starts_with(NET_SEPARATOR)) {
        return Err(decode_error(format!("{tool} output has no separator line")));
    }

    let mut body = Vec::new();
    for line in lines {
        if line.trim_start().starts_with(NET_COMPLETED) {
            return Ok(body);
        }
        if !line.trim().is_empty() {
            body.push(line);
        }
    }
    Err(decode_error(format!("{tool} output ended before completion")))
}

/// Decode `/etc/passwd`: the login name of every entry.
pub fn parse_passwd(contents: &str) -> LedgerResult<BTreeSet<String>> {
    entries(contents)
        .map(|line| match line.split_once(':') {
            Some((name, _)) if !name.is_empty() => Ok(name.to_string()),
            _ => Err(decode_error(format!("malformed passwd entry: {line:?}"))),
        })
        .collect()
}

/// Decode `/etc/group`: members of any group in [`LINUX_ADMIN_GROUPS`].
pub fn parse_group_admins(contents: &str) -> LedgerResult<BTreeSet<String>> {
    let mut admins = BTreeSet::new();
    for line in entries(contents) {
        let fields: Vec<&str> = line.split(':').collect();
        let [name, _, _, members] = fields.as_slice() else {
            return Err(decode_error(format!("malformed group entry: {line:?}")));
        };
        if LINUX_ADMIN_GROUPS.contains(name) {
            admins.extend(
                members
                    .split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string),
            );
        }
    }
    Ok(admins)
}

/// Non-blank, non-comment lines.
fn entries(contents: &str) -> impl Iterator<Item = &str> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

fn decode_error(reason: impl Into<String>) -> LedgerError {
    LedgerError::Decode {
        reason: reason.into(),
    }
}

// ── Sources ───────────────────────────────────────────────────────────────────

/// Accounts via `net user` and `net localgroup administrators`.
pub struct NetUserAccounts {
    runner: Arc<dyn CommandRunner>,
}

impl NetUserAccounts {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl SnapshotSource<AccountSnapshot> for NetUserAccounts {
    fn name(&self) -> &str {
        "net"
    }

    fn snapshot(&self) -> LedgerResult<AccountSnapshot> {
        let users = parse_net_user(&self.runner.run("net", &["user"])?)?;
        let admins =
            parse_localgroup_members(&self.runner.run("net", &["localgroup", "administrators"])?)?;
        debug!(users = users.len(), admins = admins.len(), "accounts decoded");
        Ok(AccountSnapshot { users, admins })
    }
}

/// Accounts from the passwd and group databases.
pub struct EtcAccounts {
    passwd: PathBuf,
    group: PathBuf,
}

impl EtcAccounts {
    pub fn new(passwd: impl Into<PathBuf>, group: impl Into<PathBuf>) -> Self {
        Self {
            passwd: passwd.into(),
            group: group.into(),
        }
    }

    /// `/etc/passwd` and `/etc/group`.
    pub fn system() -> Self {
        Self::new("/etc/passwd", "/etc/group")
    }

    fn read(path: &Path) -> LedgerResult<String> {
        std::fs::read_to_string(path).map_err(|e| {
            LedgerError::collection(path.display().to_string(), format!("failed to read: {e}"))
        })
    }
}

impl SnapshotSource<AccountSnapshot> for EtcAccounts {
    fn name(&self) -> &str {
        "etc-accounts"
    }

    fn snapshot(&self) -> LedgerResult<AccountSnapshot> {
        let users = parse_passwd(&Self::read(&self.passwd)?)?;
        let admins = parse_group_admins(&Self::read(&self.group)?)?;
        debug!(users = users.len(), admins = admins.len(), "accounts decoded");
        Ok(AccountSnapshot { users, admins })
    }
}
