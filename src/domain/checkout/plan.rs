//! Plan catalog entity and provider codes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::PlanId;

/// Code identifying the benefits provider that serves a plan.
///
/// Codes are compared case-insensitively and stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ProviderCode(String);

impl ProviderCode {
    pub const DOC24: &'static str = "DOC24";

    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    pub fn doc24() -> Self {
        Self(Self::DOC24.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ProviderCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<ProviderCode> for String {
    fn from(code: ProviderCode) -> Self {
        code.0
    }
}

/// Immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    /// Monthly price in cents.
    pub price_cents: i64,
    /// Provider that must enroll customers of this plan.
    pub provider: ProviderCode,
    /// Plan identifier in the provider's own catalog.
    pub provider_plan_code: String,
    pub active: bool,
}
