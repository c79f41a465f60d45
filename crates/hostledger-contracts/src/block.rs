//! Block types for the hash-chained ledger.
//!
//! `HashedBlock` is one sealed unit of the ledger. Its `hash` commits to every
//! other field, so modifying a stored block out of band is detected when the
//! chain is verified.

use serde::{Deserialize, Serialize};

use crate::event::Event;

/// What a block carries.
///
/// Mined blocks always hold an ordered list of events. Only the genesis
/// block carries the fixed text marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockPayload {
    Genesis(String),
    Events(Vec<Event>),
}

impl BlockPayload {
    /// The events in this payload; empty for genesis.
    pub fn events(&self) -> &[Event] {
        match self {
            Self::Genesis(_) => &[],
            Self::Events(events) => events,
        }
    }

    pub fn is_genesis(&self) -> bool {
        matches!(self, Self::Genesis(_))
    }
}

/// An immutable, sealed block of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashedBlock {
    /// Position in the chain; 0 for genesis, strictly +1 per block.
    pub index: u64,

    /// Creation time (RFC 3339). Only read for display and audit.
    pub timestamp: String,

    pub payload: BlockPayload,

    /// `hash` of the preceding block, or `"0"` for genesis.
    pub previous_hash: String,

    /// Proof-of-work nonce found by the sealer (0 for genesis).
    pub nonce: u64,

    /// Lowercase hex SHA-256 over index, timestamp, payload, previous hash
    /// and nonce.
    pub hash: String,
}

impl HashedBlock {
    /// The `previous_hash` sentinel carried by the genesis block.
    pub const GENESIS_PREVIOUS_HASH: &'static str = "0";
}

/// Full dump of the ledger as returned to collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainDump {
    pub length: usize,
    pub chain: Vec<HashedBlock>,
}

/// Outcome of a full-chain verification pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStatus {
    pub valid: bool,

    /// Number of blocks examined, genesis included.
    pub length: usize,

    /// Index of the first block that broke linkage or hash correctness.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_invalid_index: Option<u64>,
}
