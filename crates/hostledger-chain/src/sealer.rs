//! Proof-of-work sealing.

use tracing::debug;

use hostledger_contracts::{
    block::{BlockPayload, HashedBlock},
    event::{now_rfc3339, Event},
};

use crate::chain::{meets_difficulty, HashPrefix};

/// Mines new blocks on top of a given previous block.
///
/// The search is unbounded: the expected attempt count is `16^difficulty`.
/// Callers that must stay responsive run `seal` on a blocking worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOfWorkSealer {
    difficulty: usize,
}

impl ProofOfWorkSealer {
    pub fn new(difficulty: usize) -> Self {
        Self { difficulty }
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Build the successor of `previous` carrying `events`.
    ///
    /// The nonce starts at 1 and increments until the hash carries
    /// `difficulty` leading `'0'` hex characters. The timestamp is taken once,
    /// before mining starts.
    pub fn seal(&self, previous: &HashedBlock, events: Vec<Event>) -> HashedBlock {
        let index = previous.index + 1;
        let timestamp = now_rfc3339();
        let payload = BlockPayload::Events(events);

        let prefix = HashPrefix::new(index, &timestamp, &payload, &previous.hash);
        let mut nonce: u64 = 1;
        let hash = loop {
            let candidate = prefix.with_nonce(nonce);
            if meets_difficulty(&candidate, self.difficulty) {
                break candidate;
            }
            nonce += 1;
        };

        debug!(index, nonce, difficulty = self.difficulty, "proof of work found");
        HashedBlock {
            index,
            timestamp,
            payload,
            previous_hash: previous.hash.clone(),
            nonce,
            hash,
        }
    }
}
