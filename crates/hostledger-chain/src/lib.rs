//! # hostledger-chain
//!
//! Append-only, SHA-256 hash-chained block ledger with proof-of-work sealing.
//!
//! ## Overview
//!
//! Every block commits to its predecessor's hash and to its own fields. The
//! sealer searches for a nonce that gives the block hash a run of leading
//! `'0'` hex characters. Editing any stored block breaks that block's hash and
//! is detected by `verify_chain`, which reports the first broken index.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hostledger_chain::InMemoryLedger;
//! use hostledger_core::traits::BlockLedger;
//!
//! let ledger = InMemoryLedger::new(2);
//! let block = ledger.append(&events)?;
//! assert!(ledger.verify());
//! ```

pub mod chain;
pub mod memory;
pub mod sealer;

pub use chain::{
    block_hash, compute_hash, genesis_block, meets_difficulty, verify_chain, HashPrefix,
};
pub use memory::InMemoryLedger;
pub use sealer::ProofOfWorkSealer;

// ── Tests ─────────────────────────────────────────────────────────────────────
