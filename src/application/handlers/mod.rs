//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod activation;
pub mod checkout;

pub use activation::{
    EnrollBeneficiaryHandler, EnrollmentOutcome, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler, ProviderRegistry, WebhookOutcome,
};
pub use checkout::{
    CaptureLeadCommand, CaptureLeadHandler, CheckoutResult, ExpirePixSubscriptionsHandler,
    ExpirePixSubscriptionsResult, GetCustomerStatusHandler, GetCustomerStatusQuery,
    ProcessCheckoutHandler, UserAvailability, ValidateUserCommand, ValidateUserHandler,
    CHECKOUT_SUCCESS_MESSAGE, DEFAULT_PIX_TTL, PIX_WAITING_STATUS,
};
