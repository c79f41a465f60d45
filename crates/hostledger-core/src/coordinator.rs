//! The event coordinator: pending queue, poll schedule, and seal schedule.
//!
//! The coordinator owns the only queue in the system. Agents, the intake
//! boundary, and manual triggers all feed it; the seal path drains it into
//! the ledger.
//!
//! Locking:
//!
//! - `queue` guards the pending events. It is held only to push or to detach
//!   the whole list, never while mining.
//! - `seal_lock` serializes drains. It is held across detach + append so that
//!   blocks receive events in enqueue order and no two seals run at once.
//!
//! An event enqueued while a seal is mining lands in the freshly emptied
//! queue and goes into the next block.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use hostledger_contracts::{
    block::{ChainDump, ChainStatus, HashedBlock},
    domain::{Domain, PollTarget},
    error::{LedgerError, LedgerResult},
    event::Event,
    intake::{IntakeRequest, PendingEvents},
    monitoring::MonitoringConfig,
};
use hostledger_intake::IntakeValidator;

use crate::{
    scope::ScanScope,
    traits::{BlockLedger, EventSink, Monitor},
};

/// Timer periods for the background schedule.
///
/// Every period must be non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub file_poll: Duration,
    pub network_poll: Duration,
    pub account_poll: Duration,
    pub seal_every: Duration,
    /// Delay before the first seal tick, so events from the first polls are
    /// usually queued by then.
    pub seal_offset: Duration,
}

impl Schedule {
    pub fn poll_interval(&self, domain: Domain) -> Duration {
        match domain {
            Domain::Files => self.file_poll,
            Domain::Network => self.network_poll,
            Domain::Accounts => self.account_poll,
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            file_poll: Duration::from_secs(60),
            network_poll: Duration::from_secs(30),
            account_poll: Duration::from_secs(120),
            seal_every: Duration::from_secs(30),
            seal_offset: Duration::from_secs(5),
        }
    }
}

/// The running background tasks started by [`EventCoordinator::start`].
pub struct ScheduleHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl ScheduleHandle {
    /// Number of timer tasks (one per agent plus the sealer).
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Stop all timers. A poll or seal already running on a blocking worker
    /// finishes on its own.
    pub fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Owns the pending queue and drives agents and sealing.
pub struct EventCoordinator {
    queue: Mutex<Vec<Event>>,
    seal_lock: Mutex<()>,
    ledger: Arc<dyn BlockLedger>,
    monitors: Vec<Arc<dyn Monitor>>,
    scope: ScanScope,
    intake: IntakeValidator,
}

impl EventCoordinator {
    /// Wire a coordinator around an existing ledger and set of agents.
    pub fn new(
        ledger: Arc<dyn BlockLedger>,
        monitors: Vec<Arc<dyn Monitor>>,
        scope: ScanScope,
    ) -> LedgerResult<Self> {
        Ok(Self {
            queue: Mutex::new(Vec::new()),
            seal_lock: Mutex::new(()),
            ledger,
            monitors,
            scope,
            intake: IntakeValidator::new()?,
        })
    }

    /// Domains that have an agent attached.
    pub fn domains(&self) -> Vec<Domain> {
        self.monitors.iter().map(|m| m.domain()).collect()
    }

    // ── Queue ─────────────────────────────────────────────────────────────────

    /// Append an already-built event to the pending queue.
    pub fn enqueue(&self, event: Event) {
        let mut queue = self.lock_queue();
        queue.push(event);
        debug!(pending = queue.len(), "event enqueued");
    }

    /// Validate an externally submitted event and enqueue it.
    ///
    /// A rejected request is not queued; the error names the field.
    pub fn enqueue_event(&self, request: &IntakeRequest) -> LedgerResult<Event> {
        let event = self.intake.validate_request(request)?;
        self.enqueue(event.clone());
        Ok(event)
    }

    /// Validate a raw JSON body (as received by a transport) and enqueue it.
    pub fn enqueue_json(&self, body: &Value) -> LedgerResult<Event> {
        let event = self.intake.validate_value(body)?;
        self.enqueue(event.clone());
        Ok(event)
    }

    /// Read-only copy of the pending queue.
    pub fn list_pending(&self) -> PendingEvents {
        let events = self.lock_queue().clone();
        PendingEvents {
            count: events.len(),
            events,
        }
    }

    // ── Sealing ───────────────────────────────────────────────────────────────

    /// Drain the queue into a new block, waiting for any seal in progress.
    ///
    /// Returns `Ok(None)` and leaves the ledger untouched when the queue is
    /// empty.
    pub fn drain_and_seal(&self) -> LedgerResult<Option<HashedBlock>> {
        let _sealing = self.seal_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.seal_locked()
    }

    /// Timer-driven seal: skips the tick if another seal is still mining.
    pub fn try_seal_tick(&self) -> LedgerResult<Option<HashedBlock>> {
        let _sealing = match self.seal_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                debug!("seal already in progress; tick skipped");
                return Ok(None);
            }
        };
        self.seal_locked()
    }

    /// Force an immediate seal. An empty queue is reported as `EmptyQueue`.
    pub fn seal_now(&self) -> LedgerResult<HashedBlock> {
        self.drain_and_seal()?.ok_or(LedgerError::EmptyQueue)
    }

    /// Detach the queue and append it. Caller holds `seal_lock`.
    fn seal_locked(&self) -> LedgerResult<Option<HashedBlock>> {
        let payload = std::mem::take(&mut *self.lock_queue());
        if payload.is_empty() {
            debug!("queue empty; nothing to seal");
            return Ok(None);
        }

        let count = payload.len();
        match self.ledger.append(&payload) {
            Ok(block) => {
                info!(index = block.index, hash = %block.hash, events = count, "block sealed");
                Ok(Some(block))
            }
            Err(err) => {
                // Put the detached events back ahead of anything enqueued since.
                let mut queue = self.lock_queue();
                let newer = std::mem::replace(&mut *queue, payload);
                queue.extend(newer);
                warn!(error = %err, events = count, "seal failed; events returned to queue");
                Err(err)
            }
        }
    }

    // ── Ledger views ──────────────────────────────────────────────────────────

    pub fn chain(&self) -> LedgerResult<ChainDump> {
        let chain = self.ledger.blocks()?;
        Ok(ChainDump {
            length: chain.len(),
            chain,
        })
    }

    /// Full recompute of the chain. An invalid chain is a result, not an error.
    pub fn verify_chain(&self) -> LedgerResult<ChainStatus> {
        let status = self.ledger.verify_detailed()?;
        if !status.valid {
            warn!(
                length = status.length,
                first_invalid = ?status.first_invalid_index,
                "ledger failed verification"
            );
        }
        Ok(status)
    }

    // ── Agents ────────────────────────────────────────────────────────────────

    /// Poll every agent selected by `target` now, on the calling thread.
    ///
    /// Returns how many agents were polled.
    pub fn trigger_poll(&self, target: PollTarget) -> usize {
        let mut polled = 0;
        for monitor in self.monitors.iter().filter(|m| target.includes(m.domain())) {
            debug!(domain = %monitor.domain(), "manual poll");
            monitor.poll(self);
            polled += 1;
        }
        polled
    }

    pub fn monitoring_config(&self) -> MonitoringConfig {
        self.scope.current()
    }

    pub fn set_roots(&self, roots: Vec<String>) -> LedgerResult<MonitoringConfig> {
        let config = self.scope.set_roots(roots)?;
        info!(roots = ?config.roots, "file scan roots updated");
        Ok(config)
    }

    pub fn set_excluded_dirs(&self, excluded: Vec<String>) -> LedgerResult<MonitoringConfig> {
        let config = self.scope.set_excluded_dirs(excluded)?;
        info!(excluded_dirs = ?config.excluded_dirs, "file scan exclusions updated");
        Ok(config)
    }

    // ── Schedule ──────────────────────────────────────────────────────────────

    /// Start one poll timer per agent and one seal timer.
    ///
    /// Must be called from within a tokio runtime. Polls and seals run on
    /// blocking workers, so a slow snapshot delays only its own agent and
    /// mining never holds up intake.
    pub fn start(self: &Arc<Self>, schedule: &Schedule) -> ScheduleHandle {
        let mut tasks = Vec::with_capacity(self.monitors.len() + 1);

        for monitor in &self.monitors {
            let coordinator = Arc::clone(self);
            let monitor = Arc::clone(monitor);
            let period = schedule.poll_interval(monitor.domain());

            tasks.push(tokio::spawn(async move {
                let domain = monitor.domain();
                let mut ticker = time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    let coordinator = Arc::clone(&coordinator);
                    let monitor = Arc::clone(&monitor);
                    let worker = tokio::task::spawn_blocking(move || monitor.poll(coordinator.as_ref()));
                    if let Err(err) = worker.await {
                        warn!(%domain, error = %err, "poll worker did not complete");
                    }
                }
            }));
        }

        let coordinator = Arc::clone(self);
        let every = schedule.seal_every;
        let first = Instant::now() + schedule.seal_offset;
        tasks.push(tokio::spawn(async move {
            let mut ticker = time::interval_at(first, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let coordinator = Arc::clone(&coordinator);
                match tokio::task::spawn_blocking(move || coordinator.try_seal_tick()).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(err)) => warn!(error = %err, "scheduled seal failed"),
                    Err(err) => warn!(error = %err, "seal worker did not complete"),
                }
            }
        }));

        info!(
            agents = self.monitors.len(),
            seal_every_secs = every.as_secs_f64(),
            "schedule started"
        );
        ScheduleHandle { tasks }
    }

    fn lock_queue(&self) -> MutexGuard<'_, Vec<Event>> {
        // push and take leave the Vec consistent even if a holder panicked.
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for EventCoordinator {
    fn emit(&self, event: Event) {
        self.enqueue(event);
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use hostledger_contracts::{
        block::{BlockPayload, ChainStatus, HashedBlock},
        domain::{Domain, PollTarget},
        error::{LedgerError, LedgerResult},
        event::{Event, EventDetails, Severity},
        intake::IntakeRequest,
        monitoring::MonitoringConfig,
    };

    use crate::scope::ScanScope;
    use crate::traits::{BlockLedger, EventSink, Monitor};

    use super::{EventCoordinator, Schedule};

    // ── Mock helpers ─────────────────────────────────────────────────────────

    fn genesis() -> HashedBlock {
        HashedBlock {
            index: 0,
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
            payload: BlockPayload::Genesis("Genesis Block".to_string()),
            previous_hash: "0".to_string(),
            nonce: 0,
            hash: "h0".to_string(),
        }
    }

    /// A ledger that links blocks by fake hashes and can be made to block or fail.
    struct MockLedger {
        blocks: Mutex<Vec<HashedBlock>>,
        /// When set, `append` reports it started and waits for a release.
        gate: Option<(Mutex<mpsc::Sender<()>>, Mutex<mpsc::Receiver<()>>)>,
        fail: bool,
    }

    impl MockLedger {
        fn new() -> Self {
            Self {
                blocks: Mutex::new(vec![genesis()]),
                gate: None,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self { fail: true, ..Self::new() }
        }

        /// Returns the ledger, a receiver that fires when `append` starts,
        /// and a sender that lets `append` finish.
        fn gated() -> (Self, mpsc::Receiver<()>, mpsc::Sender<()>) {
            let (started_tx, started_rx) = mpsc::channel();
            let (release_tx, release_rx) = mpsc::channel();
            let ledger = Self {
                gate: Some((Mutex::new(started_tx), Mutex::new(release_rx))),
                ..Self::new()
            };
            (ledger, started_rx, release_tx)
        }
    }

    impl BlockLedger for MockLedger {
        fn append(&self, payload: &[Event]) -> LedgerResult<HashedBlock> {
            if self.fail {
                return Err(LedgerError::LockPoisoned {
                    reason: "simulated".to_string(),
                });
            }
            if let Some((started, release)) = &self.gate {
                started.lock().unwrap().send(()).unwrap();
                release.lock().unwrap().recv().unwrap();
            }
            let mut blocks = self.blocks.lock().unwrap();
            let last = blocks.last().unwrap().clone();
            let block = HashedBlock {
                index: last.index + 1,
                timestamp: "now".to_string(),
                payload: BlockPayload::Events(payload.to_vec()),
                previous_hash: last.hash.clone(),
                nonce: 1,
                hash: format!("h{}", last.index + 1),
            };
            blocks.push(block.clone());
            Ok(block)
        }

        fn latest(&self) -> LedgerResult<HashedBlock> {
            Ok(self.blocks.lock().unwrap().last().unwrap().clone())
        }

        fn blocks(&self) -> LedgerResult<Vec<HashedBlock>> {
            Ok(self.blocks.lock().unwrap().clone())
        }

        fn length(&self) -> LedgerResult<usize> {
            Ok(self.blocks.lock().unwrap().len())
        }

        fn verify_detailed(&self) -> LedgerResult<ChainStatus> {
            let length = self.blocks.lock().unwrap().len();
            Ok(ChainStatus { valid: true, length, first_invalid_index: None })
        }
    }

    /// An agent that emits one event per poll and counts polls.
    struct CountingMonitor {
        domain: Domain,
        polls: AtomicUsize,
    }

    impl CountingMonitor {
        fn new(domain: Domain) -> Self {
            Self { domain, polls: AtomicUsize::new(0) }
        }
    }

    impl Monitor for CountingMonitor {
        fn domain(&self) -> Domain {
            self.domain
        }

        fn poll(&self, sink: &dyn EventSink) {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            sink.emit(Event::new(
                format!("{}_tick", self.domain),
                "counting-monitor",
                Severity::Info,
                format!("poll {n}"),
                EventDetails::new(),
            ));
        }
    }

    fn scope() -> ScanScope {
        ScanScope::new(MonitoringConfig::new(vec!["/etc".into()], vec![".git".into()]).unwrap())
    }

    fn coordinator_with(ledger: Arc<dyn BlockLedger>, monitors: Vec<Arc<dyn Monitor>>) -> EventCoordinator {
        EventCoordinator::new(ledger, monitors, scope()).unwrap()
    }

    fn event(kind: &str) -> Event {
        Event::new(kind, "test", Severity::Low, "", EventDetails::new())
    }

    // ── Queue and sealing ────────────────────────────────────────────────────

    #[test]
    fn test_drain_empty_queue_is_noop() {
        let ledger = Arc::new(MockLedger::new());
        let coordinator = coordinator_with(ledger.clone(), vec![]);

        assert!(coordinator.drain_and_seal().unwrap().is_none());
        assert_eq!(ledger.length().unwrap(), 1, "no block may be created from an empty queue");
    }

    #[test]
    fn test_seal_now_on_empty_queue_reports_empty_queue() {
        let coordinator = coordinator_with(Arc::new(MockLedger::new()), vec![]);
        assert!(matches!(coordinator.seal_now(), Err(LedgerError::EmptyQueue)));
    }

    #[test]
    fn test_intake_then_seal_moves_event_into_block() {
        let ledger = Arc::new(MockLedger::new());
        let coordinator = coordinator_with(ledger.clone(), vec![]);

        coordinator
            .enqueue_event(&IntakeRequest::new("login_failed", "auth-service"))
            .unwrap();
        assert_eq!(coordinator.list_pending().count, 1);

        let block = coordinator.seal_now().unwrap();
        assert_eq!(block.index, 1);
        assert_eq!(block.payload.events().len(), 1);
        assert_eq!(block.payload.events()[0].event_type, "login_failed");
        assert_eq!(coordinator.list_pending().count, 0);
    }

    #[test]
    fn test_rejected_intake_is_not_queued() {
        let coordinator = coordinator_with(Arc::new(MockLedger::new()), vec![]);

        let result = coordinator.enqueue_event(&IntakeRequest::new("", "svc"));
        assert!(matches!(result, Err(LedgerError::Validation { .. })));

        let result = coordinator.enqueue_json(&serde_json::json!({ "type": "x", "source": "y", "details": [] }));
        assert!(matches!(result, Err(LedgerError::Validation { .. })));

        assert_eq!(coordinator.list_pending().count, 0);
    }

    /// A panic while holding the queue lock does not stop intake or sealing.
    #[test]
    fn test_poisoned_queue_lock_is_recovered() {
        let coordinator = Arc::new(coordinator_with(Arc::new(MockLedger::new()), vec![]));
        coordinator.enqueue(event("before"));

        let holder = Arc::clone(&coordinator);
        let panicked = std::thread::spawn(move || {
            let _queue = holder.queue.lock().unwrap();
            panic!("poll panicked while holding the queue");
        })
        .join();
        assert!(panicked.is_err());
        assert!(coordinator.queue.is_poisoned());

        coordinator.enqueue(event("after"));
        assert_eq!(coordinator.list_pending().count, 2);
        let block = coordinator.seal_now().unwrap();
        let kinds: Vec<_> = block.payload.events().iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(kinds, vec!["before", "after"]);
    }

    #[test]
    fn test_block_preserves_enqueue_order() {
        let coordinator = coordinator_with(Arc::new(MockLedger::new()), vec![]);
        coordinator.enqueue(event("a"));
        coordinator.enqueue(event("b"));
        coordinator.enqueue(event("c"));

        let block = coordinator.seal_now().unwrap();
        let kinds: Vec<_> = block.payload.events().iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(kinds, vec!["a", "b", "c"]);
    }

    /// An enqueue during mining neither blocks nor gets lost: it lands in the
    /// emptied queue and is sealed by the next drain.
    #[test]
    fn test_enqueue_during_seal_goes_to_next_block() {
        let (ledger, started, release) = MockLedger::gated();
        let ledger = Arc::new(ledger);
        let coordinator = Arc::new(coordinator_with(ledger.clone(), vec![]));

        coordinator.enqueue(event("first"));

        let sealer = {
            let coordinator = Arc::clone(&coordinator);
            std::thread::spawn(move || coordinator.seal_now())
        };

        started.recv().unwrap();
        coordinator.enqueue(event("second"));
        assert_eq!(coordinator.list_pending().count, 1, "queue must be usable while mining");

        release.send(()).unwrap();
        let block = sealer.join().unwrap().unwrap();
        assert_eq!(block.payload.events()[0].event_type, "first");
        assert_eq!(block.payload.events().len(), 1);

        // Let the next append through immediately.
        release.send(()).unwrap();
        let next = coordinator.seal_now().unwrap();
        assert_eq!(next.index, 2);
        assert_eq!(next.payload.events()[0].event_type, "second");
    }

    #[test]
    fn test_seal_tick_skipped_while_seal_in_progress() {
        let (ledger, started, release) = MockLedger::gated();
        let coordinator = Arc::new(coordinator_with(Arc::new(ledger), vec![]));
        coordinator.enqueue(event("first"));

        let sealer = {
            let coordinator = Arc::clone(&coordinator);
            std::thread::spawn(move || coordinator.seal_now())
        };
        started.recv().unwrap();

        coordinator.enqueue(event("second"));
        assert!(coordinator.try_seal_tick().unwrap().is_none(), "a concurrent tick must not seal");
        assert_eq!(coordinator.list_pending().count, 1);

        release.send(()).unwrap();
        sealer.join().unwrap().unwrap();
    }

    #[test]
    fn test_failed_append_returns_events_to_queue_front() {
        let coordinator = coordinator_with(Arc::new(MockLedger::failing()), vec![]);
        coordinator.enqueue(event("a"));
        coordinator.enqueue(event("b"));

        assert!(coordinator.seal_now().is_err());

        let pending = coordinator.list_pending();
        let kinds: Vec<_> = pending.events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(kinds, vec!["a", "b"]);
    }

    // ── Agents and scope ─────────────────────────────────────────────────────

    #[test]
    fn test_trigger_poll_selects_domains() {
        let files = Arc::new(CountingMonitor::new(Domain::Files));
        let network = Arc::new(CountingMonitor::new(Domain::Network));
        let coordinator = coordinator_with(
            Arc::new(MockLedger::new()),
            vec![files.clone(), network.clone()],
        );

        assert_eq!(coordinator.trigger_poll(PollTarget::One(Domain::Network)), 1);
        assert_eq!(files.polls.load(Ordering::SeqCst), 0);
        assert_eq!(network.polls.load(Ordering::SeqCst), 1);

        assert_eq!(coordinator.trigger_poll(PollTarget::All), 2);
        assert_eq!(coordinator.list_pending().count, 3);

        assert_eq!(coordinator.trigger_poll(PollTarget::One(Domain::Accounts)), 0);
    }

    #[test]
    fn test_set_roots_rejection_keeps_existing_roots() {
        let coordinator = coordinator_with(Arc::new(MockLedger::new()), vec![]);

        assert!(coordinator.set_roots(vec![]).is_err());
        assert!(coordinator.set_roots(vec![" ".into(), "\n".into()]).is_err());
        assert_eq!(coordinator.monitoring_config().roots, vec!["/etc".to_string()]);

        let updated = coordinator.set_roots(vec!["/srv".into()]).unwrap();
        assert_eq!(updated.roots, vec!["/srv".to_string()]);
        assert_eq!(updated.excluded_dirs, vec![".git".to_string()]);
    }

    #[test]
    fn test_set_excluded_dirs() {
        let coordinator = coordinator_with(Arc::new(MockLedger::new()), vec![]);
        coordinator.set_excluded_dirs(vec!["node_modules".into()]).unwrap();
        assert_eq!(coordinator.monitoring_config().excluded_dirs, vec!["node_modules".to_string()]);
    }

    // ── Schedule ─────────────────────────────────────────────────────────────

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_schedule_polls_and_seals() {
        let ledger = Arc::new(MockLedger::new());
        let monitor = Arc::new(CountingMonitor::new(Domain::Accounts));
        let coordinator = Arc::new(coordinator_with(ledger.clone(), vec![monitor.clone()]));

        let schedule = Schedule {
            file_poll: Duration::from_millis(20),
            network_poll: Duration::from_millis(20),
            account_poll: Duration::from_millis(20),
            seal_every: Duration::from_millis(40),
            seal_offset: Duration::from_millis(10),
        };
        let handle = coordinator.start(&schedule);
        assert_eq!(handle.task_count(), 2);

        tokio::time::sleep(Duration::from_millis(400)).await;
        handle.shutdown();

        assert!(monitor.polls.load(Ordering::SeqCst) >= 2, "agent must be polled repeatedly");
        assert!(ledger.length().unwrap() >= 2, "seal timer must have produced a block");

        // Every polled event is either sealed or still pending, never both.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let sealed: usize = ledger
            .blocks()
            .unwrap()
            .iter()
            .map(|b| b.payload.events().len())
            .sum();
        let pending = coordinator.list_pending().count;
        assert_eq!(sealed + pending, monitor.polls.load(Ordering::SeqCst));
    }
}
