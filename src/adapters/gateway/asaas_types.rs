//! Asaas API request and response bodies.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerBody {
    pub name: String,
    pub email: String,
    pub cpf_cnpj: String,
    pub phone: String,
    pub mobile_phone: String,
    pub postal_code: String,
    pub address_number: String,
    /// Asaas e-mails are sent by our own notification flow instead.
    pub notification_disabled: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionBody {
    pub customer: String,
    pub billing_type: &'static str,
    /// Amount in reais.
    pub value: f64,
    /// `YYYY-MM-DD`
    pub next_due_date: String,
    pub cycle: &'static str,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_card: Option<CreditCardBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_card_holder_info: Option<CardHolderInfoBody>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardBody {
    pub holder_name: String,
    pub number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub ccv: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardHolderInfoBody {
    pub name: String,
    pub email: String,
    pub cpf_cnpj: String,
    pub postal_code: String,
    pub address_number: String,
    pub phone: String,
    pub mobile_phone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdResponse {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionResponse {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentListResponse {
    #[serde(default)]
    pub data: Vec<IdResponse>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixQrCodeResponse {
    /// Base64 PNG.
    pub encoded_image: String,
    /// Copy-and-paste code.
    pub payload: String,
}

/// `{"errors": [{"code": "...", "description": "..."}]}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<ErrorItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorItem {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

/// Cents to the decimal reais amount Asaas expects.
pub fn cents_to_reais(cents: i64) -> f64 {
    cents as f64 / 100.0
}
