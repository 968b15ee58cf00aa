//! Input validation adapters.

mod checkout_rules;

pub use checkout_rules::{is_valid_cpf, RuleBasedCheckoutValidator, MINIMUM_AGE};
