//! Baseline-diff monitoring agents.
//!
//! All three agents share one algorithm, implemented once by
//! [`BaselineDiffAgent`]. What differs per domain (snapshot shape, event
//! names, how a diff becomes events) is supplied by a [`DiffPolicy`].
//!
//! Poll cycle:
//!
//! 1. Take a snapshot. On failure emit one `*_check_error` (high, empty
//!    details) and keep the baseline untouched.
//! 2. Emit any per-item collection errors the snapshot carries.
//! 3. With no baseline yet, emit one `*_baseline` event carrying the whole
//!    snapshot; otherwise emit the policy's diff events (possibly none).
//! 4. Replace the baseline with the new observation.

use std::marker::PhantomData;
use std::sync::Mutex;

use tracing::{debug, info, warn};

use hostledger_contracts::{
    domain::Domain,
    event::{Event, EventDetails, Severity},
};

use crate::traits::{EventSink, Monitor, SnapshotSource};

pub mod accounts;
pub mod files;
pub mod network;

pub use accounts::{AccountAgent, AccountMembership};
pub use files::{FileIntegrity, FileIntegrityAgent};
pub use network::{NetworkAgent, NetworkPorts};

/// Unwrap a `json!({...})` literal into event details.
pub(crate) fn details_from(value: serde_json::Value) -> EventDetails {
    match value {
        serde_json::Value::Object(map) => map,
        _ => EventDetails::new(),
    }
}

/// Domain-specific half of a baseline-diff agent.
pub trait DiffPolicy: Send + Sync + 'static {
    /// What the snapshot source returns and what the baseline stores.
    type Snapshot: Default + Clone + Send;

    const DOMAIN: Domain;

    /// Value of `Event::source` for everything this agent emits.
    const SOURCE: &'static str;

    /// Event type emitted when the whole snapshot fails.
    const CHECK_ERROR: &'static str;

    /// Whether `baseline` holds an established observation.
    fn has_baseline(baseline: &Self::Snapshot) -> bool;

    /// Per-item failures carried inside an otherwise successful snapshot.
    fn collection_errors(_current: &Self::Snapshot) -> Vec<Event> {
        Vec::new()
    }

    /// The single event emitted when a baseline is first established.
    fn baseline_event(current: &Self::Snapshot) -> Event;

    /// Events describing how `current` differs from `baseline`.
    fn diff_events(baseline: &Self::Snapshot, current: &Self::Snapshot) -> Vec<Event>;

    /// The baseline to keep after a successful poll.
    fn next_baseline(_previous: Self::Snapshot, current: Self::Snapshot) -> Self::Snapshot {
        current
    }
}

/// A monitoring agent that owns its baseline and diffs each poll against it.
///
/// The baseline lock is held for the whole poll, so a timer-driven poll and a
/// manual poll of the same agent run one after the other rather than racing
/// on the baseline.
pub struct BaselineDiffAgent<P: DiffPolicy> {
    source: Box<dyn SnapshotSource<P::Snapshot>>,
    baseline: Mutex<P::Snapshot>,
    _policy: PhantomData<P>,
}

impl<P: DiffPolicy> BaselineDiffAgent<P> {
    /// Create an agent with an empty baseline.
    pub fn new(source: Box<dyn SnapshotSource<P::Snapshot>>) -> Self {
        Self {
            source,
            baseline: Mutex::new(P::Snapshot::default()),
            _policy: PhantomData,
        }
    }

    /// A copy of the current baseline.
    pub fn baseline(&self) -> P::Snapshot {
        self.lock_baseline().clone()
    }

    fn lock_baseline(&self) -> std::sync::MutexGuard<'_, P::Snapshot> {
        // The baseline is only assigned as the last step of a poll, so a
        // panicked holder leaves the previous complete baseline behind.
        self.baseline
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<P: DiffPolicy> Monitor for BaselineDiffAgent<P> {
    fn domain(&self) -> Domain {
        P::DOMAIN
    }

    fn poll(&self, sink: &dyn EventSink) {
        let mut baseline = self.lock_baseline();

        let current = match self.source.snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(
                    agent = P::SOURCE,
                    source = %self.source.name(),
                    error = %err,
                    "snapshot failed; baseline left untouched"
                );
                sink.emit(Event::new(
                    P::CHECK_ERROR,
                    P::SOURCE,
                    Severity::High,
                    format!("{} check failed: {err}", P::DOMAIN),
                    EventDetails::new(),
                ));
                return;
            }
        };

        for event in P::collection_errors(&current) {
            sink.emit(event);
        }

        if P::has_baseline(&baseline) {
            let events = P::diff_events(&baseline, &current);
            debug!(agent = P::SOURCE, events = events.len(), "poll diffed against baseline");
            for event in events {
                sink.emit(event);
            }
        } else {
            info!(agent = P::SOURCE, "baseline established");
            sink.emit(P::baseline_event(&current));
        }

        let previous = std::mem::take(&mut *baseline);
        *baseline = P::next_baseline(previous, current);
    }
}
