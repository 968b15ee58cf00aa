//! Lead captured from a storefront visitor who has not checked out yet.
//!
//! Leads are keyed by email; capturing the same email again refreshes the
//! optional contact fields instead of creating a second lead.

use crate::domain::foundation::ValidationError;

/// Contact details left by a prospective customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    /// Trimmed and lowercased.
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl Lead {
    /// Normalizes the submitted fields. Blank optional fields become `None`.
    pub fn new(
        email: &str,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(ValidationError::empty_field("email"));
        }
        if !email.contains('@') {
            return Err(ValidationError::invalid_format("email", "not a valid address"));
        }

        Ok(Self {
            email,
            name: non_blank(name),
            phone: non_blank(phone),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
