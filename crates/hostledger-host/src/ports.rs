//! Listening-socket snapshot from `netstat -ano` (Windows) or `ss -H -tuln -p`
//! (Linux).
//!
//! Only TCP sockets in the listening state and every UDP socket are kept.
//! Decoding is all-or-nothing: one unrecognised socket row fails the whole
//! snapshot instead of silently dropping a listener.

use std::sync::Arc;

use tracing::debug;

use hostledger_contracts::{
    error::{LedgerError, LedgerResult},
    snapshot::{PortListener, PortSnapshot},
};
use hostledger_core::traits::SnapshotSource;

use crate::command::CommandRunner;

// ── Decoders ──────────────────────────────────────────────────────────────────

/// Decode Windows `netstat -ano` output.
///
/// ```text
///   Proto  Local Address          Foreign Address        State           PID
///   TCP    0.0.0.0:135            0.0.0.0:0              LISTENING       1052
///   UDP    [::]:5353              *:*                                    2412
/// ```
pub fn parse_netstat(output: &str) -> LedgerResult<PortSnapshot> {
    if !output.lines().any(|line| line.trim_start().starts_with("Proto")) {
        return Err(decode_error("netstat output has no header row"));
    }

    let mut snapshot = PortSnapshot::new();
    for line in output.lines() {
        let cols: Vec<&str> = line.split_whitespace().collect();
        let Some(proto) = cols.first().map(|p| p.to_ascii_uppercase()) else {
            continue;
        };

        let listener = match (proto.as_str(), cols.as_slice()) {
            ("TCP", [_, local, _, state, pid]) => {
                if *state != "LISTENING" {
                    continue;
                }
                listener("TCP", local, Some(*pid))?
            }
            ("UDP", [_, local, _, pid]) => listener("UDP", local, Some(*pid))?,
            ("TCP" | "UDP", _) => return Err(decode_error(format!("unrecognised netstat row: {line:?}"))),
            _ => continue,
        };
        snapshot.insert(listener.key(), listener);
    }

    debug!(listeners = snapshot.len(), "netstat decoded");
    Ok(snapshot)
}

/// Decode Linux `ss -H -tuln -p` output (no header row).
///
/// ```text
/// tcp   LISTEN 0  4096  127.0.0.53%lo:53  0.0.0.0:*  users:(("systemd-resolve",pid=612,fd=14))
/// udp   UNCONN 0  0     0.0.0.0:68        0.0.0.0:*
/// ```
pub fn parse_ss(output: &str) -> LedgerResult<PortSnapshot> {
    let mut snapshot = PortSnapshot::new();
    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 6 {
            return Err(decode_error(format!("unrecognised ss row: {line:?}")));
        }

        let (netid, state, local) = (cols[0], cols[1], cols[4]);
        let process = cols[6..].join(" ");
        let pid = pid_from_users(&process);

        let listener = match netid.to_ascii_lowercase().as_str() {
            "tcp" if state == "LISTEN" => listener("TCP", local, pid)?,
            "tcp" => continue,
            "udp" => listener("UDP", local, pid)?,
            other => return Err(decode_error(format!("unexpected socket type '{other}'"))),
        };
        snapshot.insert(listener.key(), listener);
    }

    debug!(listeners = snapshot.len(), "ss decoded");
    Ok(snapshot)
}

/// First `pid=N` inside an ss `users:((...))` column.
fn pid_from_users(process: &str) -> Option<&str> {
    let start = process.find("pid=")? + "pid=".len();
    let rest = &process[start..];
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

fn listener(protocol: &str, local: &str, pid: Option<&str>) -> LedgerResult<PortListener> {
    // rsplit so IPv6 addresses like "[::]:135" keep their colons.
    let (address, port) = local
        .rsplit_once(':')
        .ok_or_else(|| decode_error(format!("local address without port: {local:?}")))?;
    let port = port
        .parse::<u16>()
        .map_err(|_| decode_error(format!("invalid port in {local:?}")))?;
    let pid = pid
        .map(|p| {
            p.parse::<u32>()
                .map_err(|_| decode_error(format!("invalid pid {p:?}")))
        })
        .transpose()?;

    Ok(PortListener {
        protocol: protocol.to_string(),
        local_address: address.to_string(),
        port,
        pid,
    })
}

fn decode_error(reason: impl Into<String>) -> LedgerError {
    LedgerError::Decode {
        reason: reason.into(),
    }
}

// ── Sources ───────────────────────────────────────────────────────────────────

/// Listening sockets via `netstat -ano`.
pub struct NetstatPorts {
    runner: Arc<dyn CommandRunner>,
}

impl NetstatPorts {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl SnapshotSource<PortSnapshot> for NetstatPorts {
    fn name(&self) -> &str {
        "netstat"
    }

    fn snapshot(&self) -> LedgerResult<PortSnapshot> {
        parse_netstat(&self.runner.run("netstat", &["-ano"])?)
    }
}

/// Listening sockets via `ss -H -tuln -p`.
pub struct SsPorts {
    runner: Arc<dyn CommandRunner>,
}

impl SsPorts {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl SnapshotSource<PortSnapshot> for SsPorts {
    fn name(&self) -> &str {
        "ss"
    }

    fn snapshot(&self) -> LedgerResult<PortSnapshot> {
        parse_ss(&self.runner.run("ss", &["-H", "-tuln", "-p"])?)
    }
}
