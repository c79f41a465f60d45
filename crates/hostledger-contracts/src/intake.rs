//! Request and response shapes at the external intake boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::Event;

/// An event submitted from outside the agents (e.g. an HTTP client).
///
/// Only `event_type` and `source` are required. `details` stays a raw JSON
/// value so the validator can reject arrays and scalars with a precise error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntakeRequest {
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

impl IntakeRequest {
    /// A request carrying only the two required fields.
    pub fn new(event_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source: source.into(),
            ..Self::default()
        }
    }
}

/// Read-only view of the pending queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingEvents {
    pub count: usize,
    pub events: Vec<Event>,
}
