//! Dependents enrolled alongside a customer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CustomerId, DependentId, Timestamp, ValidationError};

/// Gender code used by the dependent form: 1 male, 2 female, 3 other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub struct DependentGender(i16);

impl DependentGender {
    pub fn new(code: i16) -> Result<Self, ValidationError> {
        if (1..=3).contains(&code) {
            Ok(Self(code))
        } else {
            Err(ValidationError::out_of_range("gender", 1, 3, i64::from(code)))
        }
    }

    pub fn code(&self) -> i16 {
        self.0
    }
}

impl TryFrom<i16> for DependentGender {
    type Error = ValidationError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DependentGender> for i16 {
    fn from(value: DependentGender) -> Self {
        value.0
    }
}

/// A person covered by the customer's plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependent {
    pub id: DependentId,
    pub customer_id: CustomerId,
    pub name: String,
    pub cpf: String,
    pub birth_date: NaiveDate,
    pub gender: DependentGender,
    /// Relationship to the customer ("SPOUSE", "CHILD", ...).
    pub kinship: String,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_accepts_codes_one_to_three() {
        for code in 1..=3 {
            assert_eq!(DependentGender::new(code).unwrap().code(), code);
        }
    }

    #[test]
    fn gender_rejects_out_of_range_codes() {
        assert!(DependentGender::new(0).is_err());
        assert!(DependentGender::new(4).is_err());
    }

    #[test]
    fn gender_deserialization_validates() {
        assert!(serde_json::from_str::<DependentGender>("2").is_ok());
        assert!(serde_json::from_str::<DependentGender>("9").is_err());
    }
}
