//! Square webhook events
//!
//! Verified bodies are narrowed into [`ProviderEvent`] before anything
//! acts on them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{PaymentError, Result};

/// Event type that can complete a purchase
pub const PAYMENT_UPDATED: &str = "payment.updated";

/// Square payment status
///
/// Statuses we do not know keep the raw value so it can be logged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Approved,
    Pending,
    Completed,
    Canceled,
    Failed,
    Unknown(String),
}

impl PaymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Approved => "APPROVED",
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Canceled => "CANCELED",
            Self::Failed => "FAILED",
            Self::Unknown(raw) => raw,
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl From<String> for PaymentStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "APPROVED" => Self::Approved,
            "PENDING" => Self::Pending,
            "COMPLETED" => Self::Completed,
            "CANCELED" => Self::Canceled,
            "FAILED" => Self::Failed,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment object carried by `payment.*` events
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub status: PaymentStatus,

    #[serde(default)]
    pub order_id: Option<String>,
}

/// A decoded webhook event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderEvent {
    /// `payment.updated` with a readable payment object
    PaymentUpdated {
        event_id: Option<String>,
        payment: Payment,
    },

    /// A known event type whose payload does not have the expected shape
    Malformed { event_type: String, reason: String },

    /// Any other event type
    Other { event_type: String },
}

impl ProviderEvent {
    pub fn event_type(&self) -> &str {
        match self {
            Self::PaymentUpdated { .. } => PAYMENT_UPDATED,
            Self::Malformed { event_type, .. } | Self::Other { event_type } => event_type,
        }
    }

    /// Square's delivery id, when the event carried one
    pub fn event_id(&self) -> Option<&str> {
        match self {
            Self::PaymentUpdated { event_id, .. } => event_id.as_deref(),
            Self::Malformed { .. } | Self::Other { .. } => None,
        }
    }
}

/// Turns a verified webhook body into an event
pub trait EventDecoder: Send + Sync {
    fn decode(&self, raw_body: &str) -> Result<ProviderEvent>;
}

/// JSON decoder for Square's event envelope
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonEventDecoder;

impl EventDecoder for JsonEventDecoder {
    fn decode(&self, raw_body: &str) -> Result<ProviderEvent> {
        let value: Value = serde_json::from_str(raw_body)
            .map_err(|e| PaymentError::WebhookParse(e.to_string()))?;

        let event_type = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if event_type != PAYMENT_UPDATED {
            return Ok(ProviderEvent::Other { event_type });
        }

        let Some(payment) = value.pointer("/data/object/payment") else {
            return Ok(ProviderEvent::Malformed {
                event_type,
                reason: "missing data.object.payment".into(),
            });
        };

        match serde_json::from_value::<Payment>(payment.clone()) {
            Ok(payment) => Ok(ProviderEvent::PaymentUpdated {
                event_id: value
                    .get("event_id")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                payment,
            }),
            Err(e) => Ok(ProviderEvent::Malformed {
                event_type,
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(body: &str) -> Result<ProviderEvent> {
        JsonEventDecoder.decode(body)
    }

    #[test]
    fn test_payment_updated() {
        let body = r#"{
            "merchant_id": "M1",
            "type": "payment.updated",
            "event_id": "evt_1",
            "data": {
                "type": "payment",
                "id": "pay_123",
                "object": {
                    "payment": { "id": "pay_123", "status": "COMPLETED", "order_id": "ord_9" }
                }
            }
        }"#;

        let event = decode(body).unwrap();
        assert_eq!(
            event,
            ProviderEvent::PaymentUpdated {
                event_id: Some("evt_1".into()),
                payment: Payment {
                    id: Some("pay_123".into()),
                    status: PaymentStatus::Completed,
                    order_id: Some("ord_9".into()),
                },
            }
        );
        assert_eq!(event.event_type(), "payment.updated");
        assert_eq!(event.event_id(), Some("evt_1"));
    }

    #[test]
    fn test_unknown_status() {
        let body = r#"{"type":"payment.updated","data":{"object":{"payment":{"id":"p","status":"REFUNDED_SOMEHOW"}}}}"#;
        let ProviderEvent::PaymentUpdated { payment, .. } = decode(body).unwrap() else {
            panic!("expected payment event");
        };
        assert_eq!(payment.status, PaymentStatus::Unknown("REFUNDED_SOMEHOW".into()));
        assert_eq!(payment.status.to_string(), "REFUNDED_SOMEHOW");
        assert_eq!(payment.order_id, None);
    }

    #[test]
    fn test_status_is_case_sensitive() {
        let status: PaymentStatus = serde_json::from_str(r#""COMPLETED""#).unwrap();
        assert_eq!(status, PaymentStatus::Completed);

        let status: PaymentStatus = serde_json::from_str(r#""completed""#).unwrap();
        assert_eq!(status, PaymentStatus::Unknown("completed".into()));
        assert_eq!(serde_json::to_string(&status).unwrap(), r#""completed""#);
    }

    #[test]
    fn test_other_event_types() {
        let event = decode(r#"{"type":"payment.created","data":{}}"#).unwrap();
        assert_eq!(event, ProviderEvent::Other { event_type: "payment.created".into() });

        let event = decode(r#"{"data":{}}"#).unwrap();
        assert_eq!(event, ProviderEvent::Other { event_type: String::new() });
    }

    #[test]
    fn test_malformed_payment_payload() {
        let event = decode(r#"{"type":"payment.updated","data":{"object":{}}}"#).unwrap();
        assert!(matches!(event, ProviderEvent::Malformed { .. }));

        let event = decode(r#"{"type":"payment.updated","data":{"object":{"payment":[1,2]}}}"#).unwrap();
        assert!(matches!(event, ProviderEvent::Malformed { .. }));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(decode("{not json"), Err(PaymentError::WebhookParse(_))));
        assert!(matches!(decode(""), Err(PaymentError::WebhookParse(_))));
    }
}
