//! HTTP DTOs for the checkout endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::checkout::{CheckoutResult, ValidateUserCommand};
use crate::domain::checkout::{Address, CardForm, CheckoutForm, CustomerStatus, DependentForm};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Checkout submission as posted by the storefront.
///
/// Address and card fields arrive flat; card fields are only read when
/// `card_number` is non-empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutRequest {
    pub name: String,
    pub email: String,
    pub cpf: String,
    pub phone: String,
    pub birth_date: String,
    pub gender: String,
    pub plan_id: String,
    pub payment_method: String,

    pub zip_code: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    #[serde(alias = "neighborhood")]
    pub district: String,
    pub city: String,
    pub state: String,

    pub card_holder: String,
    pub card_number: String,
    pub card_month: String,
    pub card_year: String,
    pub card_cvv: String,

    pub dependents: Vec<DependentForm>,
    pub terms_accepted: bool,
}

impl From<CheckoutRequest> for CheckoutForm {
    fn from(req: CheckoutRequest) -> Self {
        let card = if req.card_number.trim().is_empty() {
            None
        } else {
            Some(CardForm {
                holder_name: req.card_holder,
                number: req.card_number,
                expiry_month: req.card_month,
                expiry_year: req.card_year,
                ccv: req.card_cvv,
            })
        };

        CheckoutForm {
            name: req.name,
            email: req.email,
            cpf: req.cpf,
            phone: req.phone,
            birth_date: req.birth_date,
            gender: req.gender,
            address: Address {
                zip_code: req.zip_code,
                street: req.street,
                number: req.number,
                complement: req.complement.filter(|c| !c.trim().is_empty()),
                neighborhood: req.district,
                city: req.city,
                state: req.state,
            },
            plan_id: req.plan_id,
            payment_method: req.payment_method,
            card,
            dependents: req.dependents,
            terms_accepted: req.terms_accepted,
        }
    }
}

/// Identity checked for duplicates before the checkout form is sent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ValidateUserRequest {
    pub email: String,
    pub cpf: String,
}

impl From<ValidateUserRequest> for ValidateUserCommand {
    fn from(req: ValidateUserRequest) -> Self {
        ValidateUserCommand {
            email: req.email,
            cpf: req.cpf,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// `201 Created` body for a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    /// Local customer id.
    pub id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pix_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pix_qr_code_url: Option<String>,
    pub msg: String,
}

impl From<CheckoutResult> for CheckoutResponse {
    fn from(result: CheckoutResult) -> Self {
        let (pix_code, pix_qr_code_url) = match result.pix {
            Some(pix) => (Some(pix.copy_paste), Some(pix.qr_code_url)),
            None => (None, None),
        };
        Self {
            id: result.customer_id.to_string(),
            status: result.status,
            pix_code,
            pix_qr_code_url,
            msg: result.message,
        }
    }
}

/// `200 OK` body for an unused email and CPF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateUserResponse {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerStatusResponse {
    pub status: CustomerStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CustomerId, SubscriptionId};
    use crate::ports::PixArtifact;

    #[test]
    fn flat_request_maps_to_form() {
        let request: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "name": "Ana Paula Lima",
            "email": "ana@example.com",
            "cpf": "529.982.247-25",
            "plan_id": "plan",
            "payment_method": "CREDIT_CARD",
            "district": "Bela Vista",
            "complement": "",
            "card_holder": "ANA LIMA",
            "card_number": "4111111111111111",
            "card_month": "12",
            "card_year": "2030",
            "card_cvv": "123",
            "terms_accepted": true
        }))
        .unwrap();

        let form = CheckoutForm::from(request);

        assert_eq!(form.address.neighborhood, "Bela Vista");
        assert_eq!(form.address.complement, None);
        assert_eq!(form.card.as_ref().map(|c| c.ccv.as_str()), Some("123"));
        assert!(form.terms_accepted);
    }

    #[test]
    fn pix_request_has_no_card() {
        let request: CheckoutRequest =
            serde_json::from_value(serde_json::json!({"payment_method": "PIX"})).unwrap();
        assert!(CheckoutForm::from(request).card.is_none());
    }

    #[test]
    fn card_response_omits_pix_fields() {
        let response = CheckoutResponse::from(CheckoutResult {
            customer_id: CustomerId::new(),
            subscription_id: SubscriptionId::new(),
            status: "ACTIVE".to_string(),
            pix: None,
            message: "ok".to_string(),
        });
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("pix_code").is_none());
        assert!(json.get("pix_qr_code_url").is_none());
    }

    #[test]
    fn pix_response_carries_artifact() {
        let response = CheckoutResponse::from(CheckoutResult {
            customer_id: CustomerId::new(),
            subscription_id: SubscriptionId::new(),
            status: "WAITING_PAYMENT".to_string(),
            pix: Some(PixArtifact {
                copy_paste: "000201".to_string(),
                qr_code_url: "data:image/png;base64,AA".to_string(),
            }),
            message: "ok".to_string(),
        });
        assert_eq!(response.pix_code.as_deref(), Some("000201"));
        assert_eq!(response.pix_qr_code_url.as_deref(), Some("data:image/png;base64,AA"));
    }
}
