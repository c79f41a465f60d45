//! Monitored domains and the poll targets accepted by `trigger_poll`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// One area of host state watched by a baseline-diff agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Files,
    Network,
    Accounts,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Self::Files, Self::Network, Self::Accounts];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::Network => "network",
            Self::Accounts => "accounts",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which agents a manual poll should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollTarget {
    One(Domain),
    All,
}

impl PollTarget {
    /// Whether an agent watching `domain` is selected by this target.
    pub fn includes(&self, domain: Domain) -> bool {
        match self {
            Self::All => true,
            Self::One(d) => *d == domain,
        }
    }
}

impl FromStr for PollTarget {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            other => Domain::ALL
                .into_iter()
                .find(|d| d.as_str() == other)
                .map(Self::One)
                .ok_or_else(|| {
                    LedgerError::validation(
                        "domain",
                        format!("'{s}' is not one of files, network, accounts, all"),
                    )
                }),
        }
    }
}
