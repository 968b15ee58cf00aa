//! Checkout handlers.
//!
//! ## Commands
//! - Processing a checkout submission (gateway charge plus persistence saga)
//! - Expiring PIX signups that were never paid
//! - Capturing a lead before checkout
//!
//! ## Queries
//! - Customer status for the payment page poll
//! - Email/CPF duplicity check before checkout

mod capture_lead;
mod expire_pix_subscriptions;
mod get_customer_status;
mod process_checkout;
mod validate_user;

// Commands
pub use capture_lead::{CaptureLeadCommand, CaptureLeadHandler};
pub use expire_pix_subscriptions::{
    ExpirePixSubscriptionsHandler, ExpirePixSubscriptionsResult, DEFAULT_PIX_TTL,
};
pub use process_checkout::{
    CheckoutResult, ProcessCheckoutHandler, CHECKOUT_SUCCESS_MESSAGE, PIX_WAITING_STATUS,
};

// Queries
pub use get_customer_status::{GetCustomerStatusHandler, GetCustomerStatusQuery};
pub use validate_user::{UserAvailability, ValidateUserCommand, ValidateUserHandler};
