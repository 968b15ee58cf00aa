//! Activation message carried on the durable queue.
//!
//! The message is a self-contained snapshot: once published it does not
//! depend on later changes to the customer or subscription rows.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::checkout::{Customer, Plan, ProviderCode};
use crate::domain::foundation::{CustomerId, PlanId};

/// Which trigger produced an activation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationOrigin {
    /// Payment confirmation webhook from the gateway.
    #[serde(rename = "WEBHOOK_ASAAS")]
    Webhook,
    /// Direct activation at checkout time.
    #[serde(rename = "CHECKOUT")]
    Checkout,
}

impl ActivationOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivationOrigin::Webhook => "WEBHOOK_ASAAS",
            ActivationOrigin::Checkout => "CHECKOUT",
        }
    }
}

impl fmt::Display for ActivationOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the provider enrollment step needs, flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationMessage {
    pub customer_id: CustomerId,
    pub plan_id: PlanId,
    pub provider: ProviderCode,
    pub provider_plan_code: String,
    pub origin: ActivationOrigin,
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub phone: String,
    /// Birth date as `YYYY-MM-DD`.
    pub birth_date: String,
    pub gender: String,
}

impl ActivationMessage {
    /// Snapshots a customer and their plan into a message.
    pub fn for_customer(customer: &Customer, plan: &Plan, origin: ActivationOrigin) -> Self {
        Self {
            customer_id: customer.id,
            plan_id: plan.id,
            provider: plan.provider.clone(),
            provider_plan_code: plan.provider_plan_code.clone(),
            origin,
            name: customer.name.clone(),
            email: customer.email.clone(),
            cpf: customer.cpf.clone(),
            phone: customer.phone.clone(),
            birth_date: customer.birth_date.format("%Y-%m-%d").to_string(),
            gender: customer.gender.clone(),
        }
    }

    /// Serializes the message to its JSON wire form.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Parses a message from its JSON wire form.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
