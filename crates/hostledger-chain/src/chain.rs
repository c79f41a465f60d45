//! Hash-chain primitives: block hashing, the genesis block, and chain
//! verification.
//!
//! Hash input is the UTF-8 concatenation, with no separators, of:
//!   1. `index` in decimal
//!   2. `timestamp` as stored
//!   3. compact JSON of `payload` (serde_json, no pretty-printing)
//!   4. `previous_hash`
//!   5. `nonce` in decimal
//!
//! Event details are a sorted map, so the payload JSON is identical every
//! time the same block is re-serialized.

use sha2::{Digest, Sha256};

use hostledger_contracts::block::{BlockPayload, ChainStatus, HashedBlock};

/// Fixed creation time of block 0.
pub const GENESIS_TIMESTAMP: &str = "2024-01-01T00:00:00.000Z";

/// Fixed payload marker of block 0.
pub const GENESIS_MARKER: &str = "Genesis Block";

/// Compute the SHA-256 hash of a block from its fields.
///
/// Returns a lowercase 64-character hex string.
///
/// # Panics
///
/// Panics if `payload` cannot be serialized to JSON, which cannot happen for
/// string-keyed event details.
pub fn compute_hash(
    index: u64,
    timestamp: &str,
    payload: &BlockPayload,
    previous_hash: &str,
    nonce: u64,
) -> String {
    HashPrefix::new(index, timestamp, payload, previous_hash).with_nonce(nonce)
}

/// Hasher state fed with every block field except the nonce.
///
/// The payload is serialized once; each nonce attempt clones the state and
/// appends only the nonce.
#[derive(Clone)]
pub struct HashPrefix {
    hasher: Sha256,
}

impl HashPrefix {
    /// # Panics
    ///
    /// Panics if `payload` cannot be serialized to JSON.
    pub fn new(index: u64, timestamp: &str, payload: &BlockPayload, previous_hash: &str) -> Self {
        let payload_json = serde_json::to_string(payload)
            .expect("BlockPayload must always be serializable to JSON");

        let mut hasher = Sha256::new();
        hasher.update(index.to_string().as_bytes());
        hasher.update(timestamp.as_bytes());
        hasher.update(payload_json.as_bytes());
        hasher.update(previous_hash.as_bytes());
        Self { hasher }
    }

    /// Finish the hash for one nonce candidate.
    pub fn with_nonce(&self, nonce: u64) -> String {
        let mut hasher = self.hasher.clone();
        hasher.update(nonce.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Recompute the hash of a stored block from its own fields.
pub fn block_hash(block: &HashedBlock) -> String {
    compute_hash(
        block.index,
        &block.timestamp,
        &block.payload,
        &block.previous_hash,
        block.nonce,
    )
}

/// Whether `hash` starts with `difficulty` literal `'0'` characters.
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// The fixed block 0. Every ledger starts from the same genesis.
pub fn genesis_block() -> HashedBlock {
    let payload = BlockPayload::Genesis(GENESIS_MARKER.to_string());
    let hash = compute_hash(
        0,
        GENESIS_TIMESTAMP,
        &payload,
        HashedBlock::GENESIS_PREVIOUS_HASH,
        0,
    );
    HashedBlock {
        index: 0,
        timestamp: GENESIS_TIMESTAMP.to_string(),
        payload,
        previous_hash: HashedBlock::GENESIS_PREVIOUS_HASH.to_string(),
        nonce: 0,
        hash,
    }
}

/// Verify the integrity of a chain and report the first broken block.
///
/// A block is broken when any of these fail:
///
/// 1. **Position**: its `index` equals its position in the chain.
/// 2. **Linkage**: its `previous_hash` equals the preceding block's `hash`
///    (or `"0"` for block 0).
/// 3. **Hash correctness**: its `hash` matches the value recomputed from its
///    own fields.
///
/// Everything from the first broken block onward is untrusted, so only that
/// index is reported. An empty slice is invalid: a ledger always holds
/// genesis.
pub fn verify_chain(chain: &[HashedBlock]) -> ChainStatus {
    let length = chain.len();
    if chain.is_empty() {
        return ChainStatus {
            valid: false,
            length,
            first_invalid_index: Some(0),
        };
    }

    let mut expected_prev = HashedBlock::GENESIS_PREVIOUS_HASH;
    for (position, block) in chain.iter().enumerate() {
        let position = position as u64;
        let broken = block.index != position
            || block.previous_hash != expected_prev
            || block.hash != block_hash(block);
        if broken {
            return ChainStatus {
                valid: false,
                length,
                first_invalid_index: Some(position),
            };
        }
        expected_prev = &block.hash;
    }

    ChainStatus {
        valid: true,
        length,
        first_invalid_index: None,
    }
}
