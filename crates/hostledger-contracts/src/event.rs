//! Event types: one classified observation about host state.
//!
//! Events are created by an agent or by the intake boundary, wait in the
//! coordinator's pending queue, and are drained into exactly one block.
//! They are never mutated after creation.

use std::fmt;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::LedgerError;

/// How urgently an event deserves attention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
}

impl Severity {
    /// Every accepted severity, lowest first.
    pub const ALL: [Severity; 4] = [Self::Info, Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sev| sev.as_str() == s)
            .ok_or_else(|| {
                LedgerError::validation("severity", format!("'{s}' is not one of info, low, medium, high"))
            })
    }
}

/// Domain-specific fields attached to an event.
///
/// Backed by `serde_json::Map`, which keeps keys sorted, so the serialized
/// form of an event is stable and safe to feed into a block hash.
pub type EventDetails = Map<String, Value>;

/// A single observation waiting to be, or already, sealed into a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identity; lets auditors confirm no event appears in two blocks.
    pub id: Uuid,

    /// Discriminator for the observation kind (e.g. `file_integrity_change`).
    #[serde(rename = "type")]
    pub event_type: String,

    /// Which agent or intake client produced the event.
    pub source: String,

    pub severity: Severity,

    /// Human-readable summary. May be empty.
    pub message: String,

    /// Creation time, RFC 3339 in UTC.
    pub timestamp: String,

    pub details: EventDetails,
}

impl Event {
    /// Create an event stamped with a fresh id and the current time.
    pub fn new(
        event_type: impl Into<String>,
        source: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        details: EventDetails,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: event_type.into(),
            source: source.into(),
            severity,
            message: message.into(),
            timestamp: now_rfc3339(),
            details,
        }
    }
}

/// Current wall-clock time formatted the way every ledger timestamp is stored.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
