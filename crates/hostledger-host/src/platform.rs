//! Host flavour selection and agent wiring.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use hostledger_contracts::error::{LedgerError, LedgerResult};
use hostledger_core::{
    traits::Monitor, AccountAgent, FileIntegrityAgent, NetworkAgent, ScanScope,
};

use crate::{
    accounts::{EtcAccounts, NetUserAccounts},
    command::CommandRunner,
    files::FsHashSource,
    ports::{NetstatPorts, SsPorts},
};

/// Which host tools the port and account agents read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostFlavor {
    /// `netstat -ano`, `net user`, `net localgroup administrators`.
    Windows,
    /// `ss -H -tuln -p`, `/etc/passwd`, `/etc/group`.
    Linux,
}

impl HostFlavor {
    /// The flavour matching the build target.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Linux
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
        }
    }
}

impl fmt::Display for HostFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostFlavor {
    type Err = LedgerError;

    fn from_str(s: &str) -> LedgerResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            other => Err(LedgerError::validation(
                "flavor",
                format!("unknown host flavor '{other}'; expected windows or linux"),
            )),
        }
    }
}

/// Build the three agents, each with an empty baseline.
///
/// The file agent reads `scope` on every poll; port and account agents use
/// the tools of `flavor`, run through `runner`.
pub fn build_monitors(
    flavor: HostFlavor,
    scope: ScanScope,
    runner: Arc<dyn CommandRunner>,
) -> Vec<Arc<dyn Monitor>> {
    let files = FileIntegrityAgent::new(Box::new(FsHashSource::new(scope)));

    let (network, accounts) = match flavor {
        HostFlavor::Windows => (
            NetworkAgent::new(Box::new(NetstatPorts::new(Arc::clone(&runner)))),
            AccountAgent::new(Box::new(NetUserAccounts::new(runner))),
        ),
        HostFlavor::Linux => (
            NetworkAgent::new(Box::new(SsPorts::new(runner))),
            AccountAgent::new(Box::new(EtcAccounts::system())),
        ),
    };

    vec![Arc::new(files), Arc::new(network), Arc::new(accounts)]
}
