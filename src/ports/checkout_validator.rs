//! Checkout input validation port.
//!
//! The checkout handler treats validation as a pass/fail collaborator: the
//! first rule that fails is reported with the offending field.

use crate::domain::checkout::CheckoutForm;
use crate::domain::foundation::ValidationError;

/// Validates a checkout submission before any external call is made.
pub trait CheckoutValidator: Send + Sync {
    fn validate(&self, form: &CheckoutForm) -> Result<(), ValidationError>;
}

/// Validator that accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllValidator;

impl CheckoutValidator for AcceptAllValidator {
    fn validate(&self, _form: &CheckoutForm) -> Result<(), ValidationError> {
        Ok(())
    }
}
