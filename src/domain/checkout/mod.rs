//! Checkout domain module.
//!
//! Entities written by the checkout saga and the compensating transaction
//! that sequences their persistence.
//!
//! # Module Structure
//!
//! - `customer` - Customer entity, address and lifecycle status
//! - `subscription` - Subscription entity, payment method and billing cycle
//! - `plan` - Plan catalog entry and provider codes
//! - `dependent` - Dependents covered by a customer's plan
//! - `form` - Raw checkout submission
//! - `lead` - Contact captured before checkout
//! - `saga` - Operation/compensation stack
//! - `errors` - Domain vs technical checkout errors

mod customer;
mod dependent;
mod errors;
mod form;
mod lead;
mod plan;
pub mod saga;
mod subscription;

pub use customer::{split_full_name, Address, Customer, CustomerStatus};
pub use dependent::{Dependent, DependentGender};
pub use errors::CheckoutError;
pub use form::{digits_only, parse_date, CardForm, CheckoutForm, DependentForm};
pub use lead::Lead;
pub use plan::{Plan, ProviderCode};
pub use saga::{action, Action, SagaFailure, Transaction};
pub use subscription::{BillingCycle, PaymentMethod, Subscription, SubscriptionStatus};
