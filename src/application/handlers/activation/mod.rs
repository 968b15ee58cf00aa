//! Activation handlers.
//!
//! - Payment webhook: verifies, activates and enqueues
//! - Beneficiary enrollment: consumes an activation and calls the provider

mod enroll_beneficiary;
mod handle_payment_webhook;

pub use enroll_beneficiary::{EnrollBeneficiaryHandler, EnrollmentOutcome, ProviderRegistry};
pub use handle_payment_webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, WebhookOutcome,
};
