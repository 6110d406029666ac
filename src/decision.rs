//! Alert decision shape handed to the notifier.
//!
//! The engine (`engine.rs`) fills these in; delivery is someone else's job.

use serde::{Deserialize, Serialize};

/// Maximum number of locations quoted in an alert.
pub const MAX_LOCATIONS: usize = 3;

/// Summary of the records that met the alert criterion in one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub count: usize,
    pub max_fwi: f64,
    /// Up to three distinct `lat,lon` identifiers, in batch order.
    pub locations: Vec<String>,
    /// Ready-to-send text (Markdown).
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDecision {
    pub should_alert: bool,
    /// Present whenever at least one record met the criterion, even if suppressed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<AlertPayload>,
    /// True when the criterion was met on a synthetic batch and policy withheld the alert.
    #[serde(default)]
    pub suppressed_synthetic: bool,
}

impl AlertDecision {
    pub fn quiet() -> Self {
        Self {
            should_alert: false,
            payload: None,
            suppressed_synthetic: false,
        }
    }

    pub fn alert(payload: AlertPayload) -> Self {
        Self {
            should_alert: true,
            payload: Some(payload),
            suppressed_synthetic: false,
        }
    }

    pub fn suppressed(payload: AlertPayload) -> Self {
        Self {
            should_alert: false,
            payload: Some(payload),
            suppressed_synthetic: true,
        }
    }

    /// Text to deliver, only when the decision is to alert.
    pub fn message(&self) -> Option<&str> {
        if !self.should_alert {
            return None;
        }
        self.payload.as_ref().map(|p| p.message.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> AlertPayload {
        AlertPayload {
            count: 1,
            max_fwi: 62.4,
            locations: vec!["-3.40,-52.00".into()],
            message: "fire".into(),
        }
    }

    #[test]
    fn serialize_shape() {
        let v = serde_json::to_value(AlertDecision::alert(payload())).unwrap();
        assert_eq!(v["should_alert"], serde_json::json!(true));
        assert_eq!(v["payload"]["count"], serde_json::json!(1));
        assert_eq!(v["payload"]["locations"][0], serde_json::json!("-3.40,-52.00"));

        let q = serde_json::to_value(AlertDecision::quiet()).unwrap();
        assert!(q.get("payload").is_none());
    }

    #[test]
    fn suppressed_has_no_message() {
        let d = AlertDecision::suppressed(payload());
        assert!(!d.should_alert);
        assert!(d.suppressed_synthetic);
        assert_eq!(d.message(), None);
        assert_eq!(AlertDecision::alert(payload()).message(), Some("fire"));
    }
}
