//! Runtime error types for the hostledger pipeline.
//!
//! All fallible operations return `LedgerResult<T>`. Collection failures are
//! normally converted into events by the agents before they reach a caller;
//! the variants here are what crosses an API boundary.

use thiserror::Error;

/// The unified error type for the hostledger runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A seal was requested while the pending queue held no events.
    #[error("pending queue is empty; nothing to seal")]
    EmptyQueue,

    /// An externally submitted value failed validation and was not accepted.
    #[error("validation failed for '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// A snapshot source could not observe host state.
    #[error("collection failed in {source_name}: {reason}")]
    Collection { source_name: String, reason: String },

    /// Host tool output could not be decoded into a complete snapshot.
    #[error("decode error: {reason}")]
    Decode { reason: String },

    /// A configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A guarded piece of shared state was poisoned by a panicking holder.
    #[error("lock poisoned: {reason}")]
    LockPoisoned { reason: String },

    /// A background worker (poll or seal) did not complete.
    #[error("background task failed: {reason}")]
    TaskFailed { reason: String },

    /// A scripted scenario observed an outcome other than the one it expected.
    #[error("scenario check failed: {reason}")]
    ScenarioFailed { reason: String },
}

impl LedgerError {
    /// Shorthand for a `Validation` error on `field`.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a `Collection` error raised by `source_name`.
    pub fn collection(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Collection {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a poisoned-lock error, naming the state it guarded.
    pub fn poisoned<E: std::fmt::Display>(what: &str, err: E) -> Self {
        Self::LockPoisoned {
            reason: format!("{what}: {err}"),
        }
    }
}

/// Convenience alias used throughout the hostledger crates.
pub type LedgerResult<T> = Result<T, LedgerError>;
