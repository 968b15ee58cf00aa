//! Payment notification payload sent by the gateway.

use serde::{Deserialize, Serialize};

/// Event names that confirm a payment and trigger activation.
pub const ACTIVATION_EVENTS: [&str; 3] = ["PAYMENT_RECEIVED", "PAYMENT_CONFIRMED", "PAYMENT_APPROVED"];

/// Inbound webhook body: `{event, payment: {id, customer}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub event: String,
    pub payment: NotifiedPayment,
}

/// Payment section of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifiedPayment {
    pub id: String,
    /// Gateway-side customer id.
    pub customer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
}

impl PaymentNotification {
    /// True when the event is one of the payment-confirmation events.
    pub fn is_activation_event(&self) -> bool {
        ACTIVATION_EVENTS.contains(&self.event.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(event: &str) -> PaymentNotification {
        PaymentNotification {
            event: event.to_string(),
            payment: NotifiedPayment {
                id: "pay_1".to_string(),
                customer: "cus_1".to_string(),
                subscription: None,
            },
        }
    }

    #[test]
    fn confirmation_events_are_allowed() {
        for event in ACTIVATION_EVENTS {
            assert!(notification(event).is_activation_event());
        }
    }

    #[test]
    fn other_events_are_filtered() {
        assert!(!notification("PAYMENT_OVERDUE").is_activation_event());
        assert!(!notification("PAYMENT_CREATED").is_activation_event());
        assert!(!notification("payment_received").is_activation_event());
    }

    #[test]
    fn parses_gateway_body_with_extra_fields() {
        let body = r#"{"event":"PAYMENT_RECEIVED","payment":{"id":"pay_9","customer":"cus_9","value":299.0,"subscription":"sub_9"}}"#;
        let parsed: PaymentNotification = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.payment.customer, "cus_9");
        assert_eq!(parsed.payment.subscription.as_deref(), Some("sub_9"));
    }
}
