//! # hostledger-intake
//!
//! Validation of events submitted from outside the monitoring agents.
//!
//! This crate provides [`engine::IntakeValidator`]. A rejected request never
//! reaches the pending queue; the caller gets a
//! `LedgerError::Validation { field, reason }` instead.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use hostledger_intake::IntakeValidator;
//!
//! let validator = IntakeValidator::new()?;
//! let event = validator.validate_value(&serde_json::json!({
//!     "type": "login_failed",
//!     "source": "auth-service",
//! }))?;
//! ```

pub mod engine;

pub use engine::{intake_schema, IntakeFailure, IntakeValidator};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use hostledger_contracts::{error::LedgerError, event::Severity, intake::IntakeRequest};

    use crate::IntakeValidator;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn validator() -> IntakeValidator {
        IntakeValidator::new().expect("intake schema must compile")
    }

    /// Assert `result` is a validation error on `expected_field`.
    fn assert_rejected<T: std::fmt::Debug>(result: Result<T, LedgerError>, expected_field: &str) {
        match result {
            Err(LedgerError::Validation { field, .. }) => {
                assert_eq!(field, expected_field, "wrong field reported");
            }
            other => panic!("expected Validation error on '{expected_field}', got {:?}", other),
        }
    }

    // ── Typed requests ────────────────────────────────────────────────────────

    /// Only type and source are required; severity and message get defaults.
    #[test]
    fn test_minimal_request_gets_defaults() {
        let event = validator()
            .validate_request(&IntakeRequest::new("login_failed", "auth-service"))
            .unwrap();

        assert_eq!(event.event_type, "login_failed");
        assert_eq!(event.source, "auth-service");
        assert_eq!(event.severity, Severity::Info);
        assert_eq!(event.message, "");
        assert!(event.details.is_empty());
    }

    #[test]
    fn test_blank_type_rejected() {
        assert_rejected(validator().validate_request(&IntakeRequest::new("   ", "svc")), "type");
    }

    #[test]
    fn test_empty_source_rejected() {
        assert_rejected(validator().validate_request(&IntakeRequest::new("x", "")), "source");
    }

    #[test]
    fn test_array_details_rejected() {
        let request = IntakeRequest {
            details: Some(json!(["not", "a", "map"])),
            ..IntakeRequest::new("x", "svc")
        };

        match validator().validate_request(&request) {
            Err(LedgerError::Validation { field, reason }) => {
                assert_eq!(field, "details");
                assert!(reason.contains("not an array"), "unexpected reason: {reason}");
            }
            other => panic!("expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let request = IntakeRequest {
            severity: Some("critical".to_string()),
            ..IntakeRequest::new("x", "svc")
        };
        assert_rejected(validator().validate_request(&request), "severity");
    }

    #[test]
    fn test_full_request_preserves_fields() {
        let request = IntakeRequest {
            severity: Some("high".to_string()),
            message: Some("5 failed logins".to_string()),
            details: Some(json!({ "user": "root", "attempts": 5 })),
            ..IntakeRequest::new("login_failed", "auth-service")
        };

        let event = validator().validate_request(&request).unwrap();
        assert_eq!(event.severity, Severity::High);
        assert_eq!(event.message, "5 failed logins");
        assert_eq!(event.details["user"], "root");
        assert_eq!(event.details["attempts"], 5);
    }

    // ── Raw JSON bodies ───────────────────────────────────────────────────────

    #[test]
    fn test_json_body_accepted() {
        let event = validator()
            .validate_value(&json!({ "type": "port_scan", "source": "ids", "severity": "medium" }))
            .unwrap();
        assert_eq!(event.severity, Severity::Medium);
    }

    #[test]
    fn test_json_missing_source_names_field() {
        assert_rejected(validator().validate_value(&json!({ "type": "x" })), "source");
    }

    #[test]
    fn test_json_array_details_names_field() {
        assert_rejected(
            validator().validate_value(&json!({ "type": "x", "source": "y", "details": [1, 2] })),
            "details",
        );
    }

    #[test]
    fn test_json_non_string_type_names_field() {
        assert_rejected(validator().validate_value(&json!({ "type": 7, "source": "y" })), "type");
    }

    #[test]
    fn test_json_body_must_be_object() {
        assert_rejected(validator().validate_value(&json!(["type", "source"])), "body");
    }

    /// Structurally valid but semantically blank values are still rejected.
    #[test]
    fn test_json_whitespace_type_rejected() {
        assert_rejected(validator().validate_value(&json!({ "type": " ", "source": "y" })), "type");
    }
}
