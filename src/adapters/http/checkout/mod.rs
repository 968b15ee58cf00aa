//! HTTP adapter for checkout endpoints.
//!
//! - `POST /checkout` - Run the paid-subscription checkout
//! - `GET /customers/:id/status` - Poll a customer's payment status
//! - `POST /validate-user` - Reject an email or CPF that already signed up

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{
    CheckoutRequest, CheckoutResponse, CustomerStatusResponse, ValidateUserRequest,
    ValidateUserResponse,
};
pub use routes::checkout_routes;
