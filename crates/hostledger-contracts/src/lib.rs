//! # hostledger-contracts
//!
//! Shared types, snapshot models, and error contracts for the hostledger
//! runtime.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate: only data definitions, input validation of plain values, and
//! error types.

pub mod block;
pub mod domain;
pub mod error;
pub mod event;
pub mod intake;
pub mod monitoring;
pub mod snapshot;
