//! Raw checkout submission as received from the caller.
//!
//! Fields stay as submitted strings until the validator has accepted them;
//! the checkout handler converts them into entities afterwards.

use chrono::NaiveDate;
use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};

use super::Address;
use crate::domain::foundation::ValidationError;

/// Keeps only ASCII digits, dropping punctuation such as `.`, `-` and `(`.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::invalid_format(field, "expected YYYY-MM-DD"))
}

/// Storefronts post the gender code either as a number or as a digit string.
fn gender_code<'de, D>(deserializer: D) -> Result<i16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i16),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(code) => Ok(code),
        Raw::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::invalid_value(Unexpected::Str(&text), &"a gender code such as 1 or 2")),
    }
}

/// Card data collected for a credit-card checkout.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CardForm {
    pub holder_name: String,
    pub number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub ccv: String,
}

impl std::fmt::Debug for CardForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let last4: String = self
            .number
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        f.debug_struct("CardForm")
            .field("holder_name", &self.holder_name)
            .field("number", &format!("****{}", last4))
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("ccv", &"***")
            .finish()
    }
}

/// A dependent as submitted with the checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentForm {
    pub name: String,
    pub cpf: String,
    pub birth_date: String,
    #[serde(deserialize_with = "gender_code")]
    pub gender: i16,
    pub kinship: String,
}

/// Everything a caller submits to start a paid subscription.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckoutForm {
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub phone: String,
    /// `YYYY-MM-DD`.
    pub birth_date: String,
    pub gender: String,
    pub address: Address,
    pub plan_id: String,
    /// `CREDIT_CARD` or `PIX`.
    pub payment_method: String,
    pub card: Option<CardForm>,
    pub dependents: Vec<DependentForm>,
    pub terms_accepted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_only_strips_formatting() {
        assert_eq!(digits_only("529.982.247-25"), "52998224725");
        assert_eq!(digits_only("(11) 98765-4321"), "11987654321");
    }

    #[test]
    fn parse_date_accepts_iso_dates_only() {
        assert_eq!(
            parse_date("birth_date", " 1990-04-12 ").unwrap(),
            NaiveDate::from_ymd_opt(1990, 4, 12).unwrap()
        );
        let err = parse_date("birth_date", "12/04/1990").unwrap_err();
        assert_eq!(err.field(), "birth_date");
    }

    #[test]
    fn dependent_gender_accepts_number_or_digit_string() {
        let as_text: DependentForm = serde_json::from_str(
            r#"{"name":"Bia Lima","cpf":"111.444.777-35","birth_date":"2015-01-01","gender":"2","kinship":"filha"}"#,
        )
        .unwrap();
        let as_number: DependentForm = serde_json::from_str(
            r#"{"name":"Bia Lima","cpf":"111.444.777-35","birth_date":"2015-01-01","gender":2,"kinship":"filha"}"#,
        )
        .unwrap();

        assert_eq!(as_text.gender, 2);
        assert_eq!(as_text, as_number);
    }

    #[test]
    fn dependent_gender_rejects_non_numeric_text() {
        let err = serde_json::from_str::<DependentForm>(
            r#"{"name":"Bia Lima","cpf":"111.444.777-35","birth_date":"2015-01-01","gender":"F","kinship":"filha"}"#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("gender code"));
    }

    #[test]
    fn card_debug_masks_number_and_ccv() {
        let card = CardForm {
            holder_name: "ANA LIMA".to_string(),
            number: "4111111111111111".to_string(),
            expiry_month: "12".to_string(),
            expiry_year: "2030".to_string(),
            ccv: "123".to_string(),
        };
        let rendered = format!("{:?}", card);
        assert!(rendered.contains("****1111"));
        assert!(!rendered.contains("4111111111111111"));
        assert!(!rendered.contains("123\""));
    }
}
