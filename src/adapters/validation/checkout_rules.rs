//! Rule-based checkout validator.
//!
//! Checks the submitted form field by field and reports the first failure.
//! Formatting characters in CPF, phone and zip code are tolerated; only the
//! digits are checked.

use chrono::{Datelike, NaiveDate, Utc};

use crate::domain::checkout::{
    digits_only, parse_date, CardForm, CheckoutForm, DependentForm, PaymentMethod,
};
use crate::domain::foundation::ValidationError;
use crate::ports::CheckoutValidator;

/// Minimum customer age accepted at checkout.
pub const MINIMUM_AGE: u32 = 18;

/// Validator implementing the checkout form rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedCheckoutValidator;

impl RuleBasedCheckoutValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validates `form` as of `today`.
    pub fn validate_at(&self, form: &CheckoutForm, today: NaiveDate) -> Result<(), ValidationError> {
        validate_full_name("name", &form.name)?;
        validate_email(&form.email)?;
        validate_cpf("cpf", &form.cpf)?;
        validate_phone(&form.phone)?;

        let birth_date = parse_date("birth_date", &form.birth_date)?;
        let age = age_on(birth_date, today);
        if age < MINIMUM_AGE as i32 {
            return Err(ValidationError::out_of_range(
                "birth_date",
                i64::from(MINIMUM_AGE),
                150,
                i64::from(age),
            ));
        }

        let zip = digits_only(&form.address.zip_code);
        if zip.len() != 8 {
            return Err(ValidationError::invalid_format("zip_code", "must have 8 digits"));
        }
        if form.address.number.trim().is_empty() {
            return Err(ValidationError::empty_field("address.number"));
        }

        if form.plan_id.trim().is_empty() {
            return Err(ValidationError::empty_field("plan_id"));
        }

        let method: PaymentMethod = form.payment_method.parse()?;
        if method == PaymentMethod::CreditCard {
            match &form.card {
                Some(card) => validate_card(card, today)?,
                None => return Err(ValidationError::empty_field("card")),
            }
        }

        for dependent in &form.dependents {
            validate_dependent(dependent)?;
        }

        if !form.terms_accepted {
            return Err(ValidationError::invalid_format(
                "terms_accepted",
                "terms must be accepted",
            ));
        }

        Ok(())
    }
}

impl CheckoutValidator for RuleBasedCheckoutValidator {
    fn validate(&self, form: &CheckoutForm) -> Result<(), ValidationError> {
        self.validate_at(form, Utc::now().date_naive())
    }
}

/// True when `raw` holds a CPF with valid check digits.
pub fn is_valid_cpf(raw: &str) -> bool {
    let digits: Vec<u32> = digits_only(raw)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();
    if digits.len() != 11 || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }
    check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
}

fn check_digit(prefix: &[u32]) -> u32 {
    let weight_start = prefix.len() as u32 + 1;
    let sum: u32 = prefix
        .iter()
        .enumerate()
        .map(|(i, d)| d * (weight_start - i as u32))
        .sum();
    match (sum * 10) % 11 {
        10 => 0,
        r => r,
    }
}

fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

fn validate_full_name(field: &str, name: &str) -> Result<(), ValidationError> {
    let words = name.split_whitespace().count();
    if words == 0 {
        return Err(ValidationError::empty_field(field));
    }
    if words < 2 {
        return Err(ValidationError::invalid_format(field, "first and last name required"));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::empty_field("email"));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ValidationError::invalid_format("email", "not a valid address"));
    }
    Ok(())
}

fn validate_cpf(field: &str, cpf: &str) -> Result<(), ValidationError> {
    if cpf.trim().is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    if !is_valid_cpf(cpf) {
        return Err(ValidationError::invalid_format(field, "invalid CPF"));
    }
    Ok(())
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let len = digits_only(phone).len();
    if !(10..=11).contains(&len) {
        return Err(ValidationError::invalid_format("phone", "must have 10 or 11 digits"));
    }
    Ok(())
}

fn validate_card(card: &CardForm, today: NaiveDate) -> Result<(), ValidationError> {
    if card.holder_name.trim().is_empty() {
        return Err(ValidationError::empty_field("card.holder_name"));
    }
    let number = digits_only(&card.number);
    if !(13..=19).contains(&number.len()) {
        return Err(ValidationError::invalid_format("card.number", "must have 13 to 19 digits"));
    }
    let month: u32 = card
        .expiry_month
        .trim()
        .parse()
        .map_err(|_| ValidationError::invalid_format("card.expiry_month", "not a number"))?;
    if !(1..=12).contains(&month) {
        return Err(ValidationError::out_of_range("card.expiry_month", 1, 12, i64::from(month)));
    }
    let mut year: i32 = card
        .expiry_year
        .trim()
        .parse()
        .map_err(|_| ValidationError::invalid_format("card.expiry_year", "not a number"))?;
    if year < 100 {
        year += 2000;
    }
    if (year, month) < (today.year(), today.month()) {
        return Err(ValidationError::invalid_format("card.expiry_year", "card expired"));
    }
    let ccv = digits_only(&card.ccv);
    if !(3..=4).contains(&ccv.len()) || ccv.len() != card.ccv.trim().len() {
        return Err(ValidationError::invalid_format("card.ccv", "must have 3 or 4 digits"));
    }
    Ok(())
}

fn validate_dependent(dependent: &DependentForm) -> Result<(), ValidationError> {
    if dependent.name.trim().is_empty() {
        return Err(ValidationError::empty_field("dependents.name"));
    }
    validate_cpf("dependents.cpf", &dependent.cpf)?;
    parse_date("dependents.birth_date", &dependent.birth_date)?;
    if !(1..=3).contains(&dependent.gender) {
        return Err(ValidationError::out_of_range(
            "dependents.gender",
            1,
            3,
            i64::from(dependent.gender),
        ));
    }
    if dependent.kinship.trim().is_empty() {
        return Err(ValidationError::empty_field("dependents.kinship"));
    }
    Ok(())
}
