//! # hostledger-core
//!
//! The monitoring runtime for hostledger.
//!
//! This crate provides:
//! - The core traits (`SnapshotSource`, `EventSink`, `Monitor`, `BlockLedger`)
//! - The baseline-diff agents for files, listening ports, and accounts
//! - The `EventCoordinator` that queues events, drives polls, and seals blocks
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hostledger_core::{EventCoordinator, Schedule, ScanScope};
//!
//! let coordinator = Arc::new(EventCoordinator::new(ledger, monitors, scope)?);
//! let handle = coordinator.start(&Schedule::default());
//! ```

pub mod agents;
pub mod coordinator;
pub mod diff;
pub mod scope;
pub mod traits;

pub use agents::{AccountAgent, BaselineDiffAgent, DiffPolicy, FileIntegrityAgent, NetworkAgent};
pub use coordinator::{EventCoordinator, Schedule, ScheduleHandle};
pub use scope::ScanScope;
