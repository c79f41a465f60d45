//! Core trait definitions for the hostledger pipeline.
//!
//! These four traits are the seams between the coordinator and everything
//! it drives:
//!
//! - `SnapshotSource`: observes host state (filesystem, sockets, accounts)
//! - `EventSink`: accepts classified events (the pending queue)
//! - `Monitor`: one baseline-diff agent, pollable on a timer
//! - `BlockLedger`: the append-only, hash-chained block store
//!
//! Host-facing implementations live in `hostledger-host`; the ledger lives in
//! `hostledger-chain`. Nothing here performs I/O.

use hostledger_contracts::{
    block::{ChainStatus, HashedBlock},
    domain::Domain,
    error::LedgerResult,
    event::Event,
};

/// Produces a complete snapshot of one area of host state.
///
/// Implementations either return the full snapshot or an error. They must
/// never return a partially populated snapshot, because the agent replaces
/// its baseline with whatever comes back.
pub trait SnapshotSource<T>: Send + Sync {
    /// Short name used in logs and collection errors (e.g. `"netstat"`).
    fn name(&self) -> &str;

    /// Observe the current state. May block on filesystem or process I/O.
    fn snapshot(&self) -> LedgerResult<T>;
}

/// Destination for events produced by agents.
///
/// `emit` is infallible from the caller's side: an agent has no useful way to
/// react to a full or broken sink, and a poll must never abort because of it.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// A pollable monitoring agent.
///
/// `poll` converts every collection failure into an event, so it has no
/// error return; a failed poll never stops later scheduled polls.
pub trait Monitor: Send + Sync {
    /// The domain this agent watches.
    fn domain(&self) -> Domain;

    /// Run one snapshot-diff-emit cycle.
    fn poll(&self, sink: &dyn EventSink);
}

/// The hash-chained block store.
///
/// The chain is never empty: implementations start with a genesis block.
pub trait BlockLedger: Send + Sync {
    /// Seal `payload` into a new block on top of the latest one and append it.
    ///
    /// Implementations must serialize concurrent appends so indexes have no
    /// gaps and every block links to its predecessor.
    fn append(&self, payload: &[Event]) -> LedgerResult<HashedBlock>;

    /// The most recently appended block (genesis on a fresh ledger).
    fn latest(&self) -> LedgerResult<HashedBlock>;

    /// A point-in-time copy of the whole chain.
    fn blocks(&self) -> LedgerResult<Vec<HashedBlock>>;

    /// Number of blocks, genesis included.
    fn length(&self) -> LedgerResult<usize>;

    /// Recompute every block and report the first violation, if any.
    fn verify_detailed(&self) -> LedgerResult<ChainStatus>;

    /// `true` when the whole chain passes verification.
    fn verify(&self) -> bool {
        self.verify_detailed().map(|status| status.valid).unwrap_or(false)
    }
}
