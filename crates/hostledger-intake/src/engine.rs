//! Intake validator for externally submitted events.
//!
//! Validation runs in two phases:
//!
//! 1. **Structural**: a raw JSON body is checked against the intake JSON
//!    Schema with the `jsonschema` crate (types, required keys, severity
//!    enumeration, `details` must be an object).
//! 2. **Semantic**: the typed `IntakeRequest` is checked for rules JSON
//!    Schema does not express well: `type` and `source` must contain
//!    non-whitespace text, and the severity must parse.
//!
//! All failures are collected and logged; the caller receives the first one
//! as a `LedgerError::Validation` carrying the field name and reason.

use serde_json::{json, Value};
use tracing::{debug, warn};

use hostledger_contracts::{
    error::{LedgerError, LedgerResult},
    event::{Event, Severity},
    intake::IntakeRequest,
};

/// A single rule failure found while validating an intake request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeFailure {
    /// Name of the offending field, or `"body"` for the request as a whole.
    pub field: String,
    pub reason: String,
}

impl From<IntakeFailure> for LedgerError {
    fn from(failure: IntakeFailure) -> Self {
        LedgerError::Validation {
            field: failure.field,
            reason: failure.reason,
        }
    }
}

/// Keys every intake body must carry.
const REQUIRED_FIELDS: [&str; 2] = ["type", "source"];

/// The JSON Schema every raw intake body must satisfy.
pub fn intake_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["type", "source"],
        "properties": {
            "type": { "type": "string" },
            "source": { "type": "string" },
            "severity": { "enum": ["info", "low", "medium", "high", null] },
            "message": { "type": ["string", "null"] },
            "details": { "type": ["object", "null"] }
        }
    })
}

/// Validates intake requests and turns accepted ones into events.
pub struct IntakeValidator {
    validator: jsonschema::Validator,
}

impl IntakeValidator {
    /// Compile the intake schema.
    pub fn new() -> LedgerResult<Self> {
        let validator = jsonschema::validator_for(&intake_schema()).map_err(|e| {
            LedgerError::ConfigError {
                reason: format!("invalid intake schema: {e}"),
            }
        })?;
        Ok(Self { validator })
    }

    /// Validate a raw JSON body (structural, then semantic) and build the event.
    pub fn validate_value(&self, body: &Value) -> LedgerResult<Event> {
        let failures = self.structural_failures(body);
        if let Some(first) = report(failures) {
            return Err(first.into());
        }

        let request: IntakeRequest = serde_json::from_value(body.clone())
            .map_err(|e| LedgerError::validation("body", e.to_string()))?;
        self.validate_request(&request)
    }

    /// Validate an already-typed request and build the event.
    pub fn validate_request(&self, request: &IntakeRequest) -> LedgerResult<Event> {
        let mut failures = Vec::new();

        let event_type = non_blank(&mut failures, "type", &request.event_type);
        let source = non_blank(&mut failures, "source", &request.source);

        let severity = match request.severity.as_deref() {
            None => Severity::default(),
            Some(raw) => raw.parse::<Severity>().unwrap_or_else(|err| {
                failures.push(IntakeFailure {
                    field: "severity".to_string(),
                    reason: match err {
                        LedgerError::Validation { reason, .. } => reason,
                        other => other.to_string(),
                    },
                });
                Severity::default()
            }),
        };

        let details = match &request.details {
            None | Some(Value::Null) => Default::default(),
            Some(Value::Object(map)) => map.clone(),
            Some(Value::Array(_)) => {
                failures.push(IntakeFailure {
                    field: "details".to_string(),
                    reason: "must be an object mapping, not an array".to_string(),
                });
                Default::default()
            }
            Some(_) => {
                failures.push(IntakeFailure {
                    field: "details".to_string(),
                    reason: "must be an object mapping".to_string(),
                });
                Default::default()
            }
        };

        if let Some(first) = report(failures) {
            return Err(first.into());
        }

        debug!(event_type = %event_type, source = %source, %severity, "intake event accepted");
        Ok(Event::new(
            event_type,
            source,
            severity,
            request.message.clone().unwrap_or_default(),
            details,
        ))
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn structural_failures(&self, body: &Value) -> Vec<IntakeFailure> {
        self.validator
            .iter_errors(body)
            .map(|error| {
                let path = error.instance_path.to_string();
                let reason = error.to_string();
                let field = match path.trim_start_matches('/') {
                    // Missing keys are reported against the object itself; the
                    // message names the key.
                    "" => REQUIRED_FIELDS
                        .iter()
                        .find(|key| reason.contains(&format!("\"{key}\" is a required property")))
                        .copied()
                        .unwrap_or("body")
                        .to_string(),
                    field => field.to_string(),
                };
                IntakeFailure { field, reason }
            })
            .collect()
    }
}

/// Trimmed `value`, recording a failure when nothing is left.
fn non_blank(failures: &mut Vec<IntakeFailure>, field: &str, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        failures.push(IntakeFailure {
            field: field.to_string(),
            reason: "is required and must be a non-empty string".to_string(),
        });
    }
    trimmed.to_string()
}

/// Log every failure and hand back the first.
fn report(failures: Vec<IntakeFailure>) -> Option<IntakeFailure> {
    for failure in &failures {
        warn!(field = %failure.field, reason = %failure.reason, "intake event rejected");
    }
    failures.into_iter().next()
}
