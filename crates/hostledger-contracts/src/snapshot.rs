//! Typed snapshot models produced by host sources and consumed by agents.
//!
//! A source returns one of these or an explicit error; there is no partial
//! state in between.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Content digests for every readable file under the configured roots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSnapshot {
    /// Absolute path → lowercase hex SHA-256 of the file bytes.
    pub digests: BTreeMap<String, String>,

    /// Paths that were found but could not be read, with the reason.
    pub unreadable: BTreeMap<String, String>,
}

/// One listening socket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortListener {
    /// `TCP` or `UDP`, upper-case.
    pub protocol: String,
    pub local_address: String,
    pub port: u16,
    /// Owning process, when the host tool reports one.
    pub pid: Option<u32>,
}

impl PortListener {
    /// Identity key used by the network baseline: `protocol:address:port`.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.protocol, self.local_address, self.port)
    }
}

/// Listening sockets keyed by `PortListener::key`.
pub type PortSnapshot = BTreeMap<String, PortListener>;

/// Local account membership: all users, and members of the administrators
/// group. Both sets are observed in the same poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub users: BTreeSet<String>,
    pub admins: BTreeSet<String>,
}

impl AccountSnapshot {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.admins.is_empty()
    }
}
