//! Activation domain module.
//!
//! The payment-confirmation webhook, its signature check, and the message
//! that hands a confirmed customer to the provider enrollment worker.

mod message;
mod webhook_errors;
mod webhook_event;
mod webhook_verifier;

pub use message::{ActivationMessage, ActivationOrigin};
pub use webhook_errors::WebhookError;
pub use webhook_event::{NotifiedPayment, PaymentNotification, ACTIVATION_EVENTS};
pub use webhook_verifier::{
    sign_payload, SignatureMode, Verification, WebhookVerifier, SIGNATURE_HEADER,
};
