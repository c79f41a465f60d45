//! In-memory implementation of `BlockLedger`.
//!
//! `InMemoryLedger` keeps the chain in a `Vec` behind a `RwLock`. Appends are
//! serialized by a separate `append_lock`, and mining happens while holding
//! only that lock, so readers (`blocks`, `latest`, `verify_detailed`) are never
//! held up by proof-of-work.

use std::sync::{Mutex, RwLock, RwLockReadGuard};

use tracing::info;

use hostledger_contracts::{
    block::{ChainStatus, HashedBlock},
    error::{LedgerError, LedgerResult},
    event::Event,
};
use hostledger_core::traits::BlockLedger;

use crate::{
    chain::{genesis_block, verify_chain},
    sealer::ProofOfWorkSealer,
};

/// An in-memory, append-only block ledger backed by a SHA-256 hash chain.
pub struct InMemoryLedger {
    sealer: ProofOfWorkSealer,

    /// All blocks in append order; never empty.
    pub(crate) chain: RwLock<Vec<HashedBlock>>,

    /// Held for the whole of `append` so the block being mined stays on top.
    append_lock: Mutex<()>,
}

impl InMemoryLedger {
    /// Create a ledger holding only the genesis block.
    pub fn new(difficulty: usize) -> Self {
        let genesis = genesis_block();
        info!(hash = %genesis.hash, difficulty, "ledger initialized");
        Self {
            sealer: ProofOfWorkSealer::new(difficulty),
            chain: RwLock::new(vec![genesis]),
            append_lock: Mutex::new(()),
        }
    }

    pub fn difficulty(&self) -> usize {
        self.sealer.difficulty()
    }

    fn read_chain(&self) -> LedgerResult<RwLockReadGuard<'_, Vec<HashedBlock>>> {
        self.chain
            .read()
            .map_err(|e| LedgerError::poisoned("ledger chain", e))
    }
}

// ── BlockLedger impl ──────────────────────────────────────────────────────────

impl BlockLedger for InMemoryLedger {
    /// Mine a block over `payload` on top of the current last block and push it.
    ///
    /// Empty payloads are accepted; the coordinator is the one that refuses
    /// to seal an empty queue.
    fn append(&self, payload: &[Event]) -> LedgerResult<HashedBlock> {
        let _appending = self
            .append_lock
            .lock()
            .map_err(|e| LedgerError::poisoned("ledger append lock", e))?;

        let previous = self.latest()?;
        let block = self.sealer.seal(&previous, payload.to_vec());

        let mut chain = self
            .chain
            .write()
            .map_err(|e| LedgerError::poisoned("ledger chain", e))?;
        chain.push(block.clone());

        Ok(block)
    }

    fn latest(&self) -> LedgerResult<HashedBlock> {
        self.read_chain()?
            .last()
            .cloned()
            .ok_or_else(|| LedgerError::poisoned("ledger chain", "no genesis block"))
    }

    fn blocks(&self) -> LedgerResult<Vec<HashedBlock>> {
        Ok(self.read_chain()?.clone())
    }

    fn length(&self) -> LedgerResult<usize> {
        Ok(self.read_chain()?.len())
    }

    fn verify_detailed(&self) -> LedgerResult<ChainStatus> {
        Ok(verify_chain(&self.read_chain()?))
    }
}
