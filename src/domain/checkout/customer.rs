//! Customer entity.
//!
//! A customer is created once, at checkout submission, and afterwards only
//! the activation path touches it (status and provider beneficiary id).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{CustomerId, PlanId, Timestamp, ValidationError};

/// Customer lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerStatus {
    /// Record exists, no payment attempt confirmed yet.
    Pending,
    /// Charge issued, waiting for the gateway to confirm it.
    WaitingPayment,
    /// Payment confirmed.
    Active,
    /// Payment window elapsed without confirmation.
    Expired,
}

impl CustomerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::Pending => "PENDING",
            CustomerStatus::WaitingPayment => "WAITING_PAYMENT",
            CustomerStatus::Active => "ACTIVE",
            CustomerStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CustomerStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(CustomerStatus::Pending),
            "WAITING_PAYMENT" => Ok(CustomerStatus::WaitingPayment),
            "ACTIVE" => Ok(CustomerStatus::Active),
            "EXPIRED" => Ok(CustomerStatus::Expired),
            other => Err(ValidationError::invalid_format(
                "customer_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// Postal address value object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub zip_code: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

/// The paying account holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    /// Brazilian national id (CPF), digits only.
    pub cpf: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    /// Free-form gender marker as captured by the checkout form.
    pub gender: String,
    pub address: Address,
    pub plan_id: PlanId,
    /// Customer id assigned by the payment gateway.
    pub external_customer_id: String,
    /// Beneficiary id assigned by the benefits provider after enrollment.
    pub provider_id: Option<String>,
    pub status: CustomerStatus,
    pub terms_accepted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Customer {
    /// Full name split into first word and remainder.
    pub fn name_parts(&self) -> (&str, &str) {
        split_full_name(&self.name)
    }
}

/// Splits a full name into (first name, last names).
pub fn split_full_name(full: &str) -> (&str, &str) {
    let trimmed = full.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim_start()),
        None => (trimmed, ""),
    }
}
