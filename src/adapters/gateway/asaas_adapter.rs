//! Asaas payment gateway adapter.
//!
//! Implements the `PaymentGateway` port over the Asaas REST API. Every call
//! authenticates with the `access_token` header and runs under the
//! configured request timeout.
//!
//! # PIX flow
//!
//! Asaas creates the first charge of a PIX subscription asynchronously, so
//! the QR code takes three calls: create the subscription, list its first
//! payment, then fetch that payment's QR code. If the follow-up calls fail
//! the freshly created subscription is cancelled before the error is
//! returned, leaving nothing behind at the gateway.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::ports::{
    CardSubscriptionRequest, GatewayCustomer, GatewaySubscription, PaymentError,
    PaymentErrorCode, PaymentGateway, PixArtifact, PixSubscription, PixSubscriptionRequest,
};

use super::asaas_types::{
    cents_to_reais, CardHolderInfoBody, CreateCustomerBody, CreateSubscriptionBody,
    CreditCardBody, ErrorResponse, IdResponse, PaymentListResponse, PixQrCodeResponse,
    SubscriptionResponse,
};

const DEFAULT_BASE_URL: &str = "https://api.asaas.com/v3";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const SUBSCRIPTION_DESCRIPTION: &str = "Assinatura Ligue Saúde";
/// Brasília time; Brazil has not observed daylight saving since 2019.
const BRT_OFFSET_SECS: i64 = 3 * 3600;

/// Asaas API configuration.
#[derive(Clone)]
pub struct AsaasConfig {
    api_key: SecretString,
    base_url: String,
    timeout: Duration,
}

impl AsaasConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set a custom API base URL (sandbox or tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for AsaasConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsaasConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Asaas payment gateway adapter.
#[derive(Debug)]
pub struct AsaasGateway {
    config: AsaasConfig,
    http_client: reqwest::Client,
}

impl AsaasGateway {
    pub fn new(config: AsaasConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent("benefit-checkout/0.1")
            .build()
            .map_err(|e| PaymentError::network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> Result<R, PaymentError> {
        let request = self.http_client.post(self.url(path)).json(body);
        self.send(operation, request).await
    }

    async fn get<R: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<R, PaymentError> {
        let request = self.http_client.get(self.url(path));
        self.send(operation, request).await
    }

    async fn send<R: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<R, PaymentError> {
        let response = request
            .header("access_token", self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(operation, status = status.as_u16(), error = %body, "Asaas request failed");
            return Err(status_error(status, &body));
        }

        response.json().await.map_err(|e| {
            PaymentError::provider(format!("failed to parse Asaas {} response: {}", operation, e))
        })
    }

    async fn first_payment_qr_code(&self, subscription_id: &str) -> Result<PixArtifact, PaymentError> {
        let payments: PaymentListResponse = self
            .get(
                "list_payments",
                &format!("/subscriptions/{}/payments?limit=1", subscription_id),
            )
            .await?;

        let payment = payments
            .data
            .into_iter()
            .next()
            .ok_or_else(|| PaymentError::provider("subscription has no charge yet"))?;

        let qr: PixQrCodeResponse = self
            .get("pix_qr_code", &format!("/payments/{}/pixQrCode", payment.id))
            .await?;

        Ok(PixArtifact {
            copy_paste: qr.payload,
            qr_code_url: image_data_uri(&qr.encoded_image),
        })
    }
}

#[async_trait]
impl PaymentGateway for AsaasGateway {
    async fn create_customer(&self, profile: &GatewayCustomer) -> Result<String, PaymentError> {
        let body = CreateCustomerBody {
            name: profile.name.clone(),
            email: profile.email.clone(),
            cpf_cnpj: profile.cpf_cnpj.clone(),
            phone: profile.phone.clone(),
            mobile_phone: profile.phone.clone(),
            postal_code: profile.postal_code.clone(),
            address_number: profile.address_number.clone(),
            notification_disabled: true,
        };
        let created: IdResponse = self.post("create_customer", "/customers", &body).await?;
        Ok(created.id)
    }

    async fn subscribe(
        &self,
        request: &CardSubscriptionRequest,
    ) -> Result<GatewaySubscription, PaymentError> {
        let card = &request.card;
        let holder = &request.holder;
        let body = CreateSubscriptionBody {
            customer: request.external_customer_id.clone(),
            billing_type: "CREDIT_CARD",
            value: cents_to_reais(request.amount_cents),
            next_due_date: today_in_brazil(),
            cycle: "MONTHLY",
            description: SUBSCRIPTION_DESCRIPTION.to_string(),
            credit_card: Some(CreditCardBody {
                holder_name: card.holder_name.clone(),
                number: card.number.clone(),
                expiry_month: card.expiry_month.clone(),
                expiry_year: card.expiry_year.clone(),
                ccv: card.ccv.clone(),
            }),
            credit_card_holder_info: Some(CardHolderInfoBody {
                name: card.holder_name.clone(),
                email: holder.email.clone(),
                cpf_cnpj: holder.cpf_cnpj.clone(),
                postal_code: holder.postal_code.clone(),
                address_number: holder.address_number.clone(),
                phone: holder.phone.clone(),
                mobile_phone: holder.phone.clone(),
            }),
        };

        let created: SubscriptionResponse =
            self.post("subscribe", "/subscriptions", &body).await?;
        Ok(GatewaySubscription {
            id: created.id,
            status: created.status,
        })
    }

    async fn subscribe_pix(
        &self,
        request: &PixSubscriptionRequest,
    ) -> Result<PixSubscription, PaymentError> {
        let body = CreateSubscriptionBody {
            customer: request.external_customer_id.clone(),
            billing_type: "PIX",
            value: cents_to_reais(request.amount_cents),
            next_due_date: today_in_brazil(),
            cycle: "MONTHLY",
            description: SUBSCRIPTION_DESCRIPTION.to_string(),
            credit_card: None,
            credit_card_holder_info: None,
        };
        let created: IdResponse = self.post("subscribe_pix", "/subscriptions", &body).await?;

        match self.first_payment_qr_code(&created.id).await {
            Ok(pix) => Ok(PixSubscription {
                id: created.id,
                pix,
            }),
            Err(e) => {
                if let Err(cancel) = self.cancel_subscription(&created.id).await {
                    tracing::warn!(
                        subscription_id = %created.id,
                        error = %cancel,
                        "failed to cancel PIX subscription without QR code"
                    );
                }
                Err(e)
            }
        }
    }

    async fn cancel_subscription(&self, external_subscription_id: &str) -> Result<(), PaymentError> {
        let request = self
            .http_client
            .delete(self.url(&format!("/subscriptions/{}", external_subscription_id)));
        let _: serde_json::Value = self.send("cancel_subscription", request).await?;
        tracing::info!(subscription_id = %external_subscription_id, "gateway subscription cancelled");
        Ok(())
    }
}

fn transport_error(e: reqwest::Error) -> PaymentError {
    if e.is_timeout() {
        PaymentError::timeout(format!("Asaas request timed out: {}", e))
    } else {
        PaymentError::network(e.to_string())
    }
}

fn status_error(status: reqwest::StatusCode, body: &str) -> PaymentError {
    let parsed: ErrorResponse = serde_json::from_str(body).unwrap_or_default();
    let first = parsed.errors.into_iter().next();
    let message = first
        .as_ref()
        .map(|e| e.description.clone())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("Asaas API error ({})", status.as_u16()));

    let code = match status.as_u16() {
        401 | 403 => PaymentErrorCode::AuthenticationError,
        400 if first.as_ref().is_some_and(|e| e.code.contains("creditCard")) => {
            PaymentErrorCode::CardDeclined
        }
        400 | 404 | 422 => PaymentErrorCode::InvalidRequest,
        _ => PaymentErrorCode::ProviderError,
    };

    let error = PaymentError::new(code, message);
    match first.map(|e| e.code).filter(|c| !c.is_empty()) {
        Some(provider_code) => error.with_provider_code(provider_code),
        None => error,
    }
}

fn today_in_brazil() -> String {
    let local = Utc::now().naive_utc() - chrono::Duration::seconds(BRT_OFFSET_SECS);
    local.format("%Y-%m-%d").to_string()
}

fn image_data_uri(encoded_image: &str) -> String {
    if encoded_image.starts_with("data:") || encoded_image.starts_with("http") {
        encoded_image.to_string()
    } else {
        format!("data:image/png;base64,{}", encoded_image)
    }
}
