//! Subscription entity.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{CustomerId, PlanId, SubscriptionId, Timestamp, ValidationError};

/// Subscription lifecycle status.
///
/// `Pending` until the gateway confirms payment, then `Active`. PIX
/// subscriptions left `Pending` past the payment window become `Expired`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Pending,
    Active,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "PENDING",
            SubscriptionStatus::Active => "ACTIVE",
            SubscriptionStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(SubscriptionStatus::Pending),
            "ACTIVE" => Ok(SubscriptionStatus::Active),
            "EXPIRED" => Ok(SubscriptionStatus::Expired),
            other => Err(ValidationError::invalid_format(
                "subscription_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "CREDIT_CARD")]
    CreditCard,
    #[serde(rename = "PIX")]
    Pix,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::Pix => "PIX",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREDIT_CARD" | "CARD" => Ok(PaymentMethod::CreditCard),
            "PIX" => Ok(PaymentMethod::Pix),
            other => Err(ValidationError::invalid_format(
                "payment_method",
                format!("unsupported payment method '{}'", other),
            )),
        }
    }
}

/// Billing cadence of a recurring charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingCycle {
    Monthly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "MONTHLY",
        }
    }
}

impl FromStr for BillingCycle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MONTHLY" => Ok(BillingCycle::Monthly),
            other => Err(ValidationError::invalid_format(
                "billing_cycle",
                format!("unsupported cycle '{}'", other),
            )),
        }
    }
}

/// Links a customer to a plan with a recurring charge.
///
/// # Invariants
///
/// - A subscription never exists without its customer row.
/// - `plan_id`, when present, references an existing plan.
/// - `amount_cents` is the plan price at the time of checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub customer_id: CustomerId,
    /// Always set by checkout. Legacy rows may carry no plan, which the
    /// activation trigger treats as an integrity error.
    pub plan_id: Option<PlanId>,
    pub amount_cents: i64,
    pub status: SubscriptionStatus,
    pub payment_method: PaymentMethod,
    pub billing_cycle: BillingCycle,
    pub next_due_date: NaiveDate,
    /// Subscription id assigned by the payment gateway.
    pub external_subscription_id: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
