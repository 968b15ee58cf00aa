//! Doc24 HTTP client.
//!
//! Authenticates with client credentials and caches the bearer token until
//! it is within [`TOKEN_REFRESH_MARGIN`] of expiring. The cache sits behind
//! an async mutex so concurrent enrollments share one refresh.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use crate::domain::activation::ActivationMessage;
use crate::domain::checkout::ProviderCode;
use crate::ports::{BenefitProvider, Enrollment, EnrollmentError};

use super::dto::{Affiliate, AuthenticationRequest, AuthenticationResponse, EligibilityResponse};

pub const DEFAULT_BASE_URL: &str = "https://tapi.doc24.com.ar/ws/api/v2";
pub const DEFAULT_EMPRESA: &str = "Ag Med";
pub const DEFAULT_PLAN_CODE: &str = "ligue saude em dia individual";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(30);

/// Doc24 credentials and enrollment defaults.
#[derive(Clone)]
pub struct Doc24Config {
    pub client_id: String,
    pub client_secret: SecretString,
    pub base_url: String,
    pub empresa: String,
    pub default_plan_code: String,
    pub timeout: Duration,
}

impl Doc24Config {
    pub fn new(client_id: impl Into<String>, client_secret: SecretString) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            base_url: DEFAULT_BASE_URL.to_string(),
            empresa: DEFAULT_EMPRESA.to_string(),
            default_plan_code: DEFAULT_PLAN_CODE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_empresa(mut self, empresa: impl Into<String>) -> Self {
        self.empresa = empresa.into();
        self
    }

    pub fn with_default_plan_code(mut self, code: impl Into<String>) -> Self {
        self.default_plan_code = code.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for Doc24Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Doc24Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("empresa", &self.empresa)
            .field("default_plan_code", &self.default_plan_code)
            .field("timeout", &self.timeout)
            .finish()
    }
}

struct CachedToken {
    value: SecretString,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

/// Enrolls customers as Doc24 affiliates.
pub struct Doc24Client {
    config: Doc24Config,
    http_client: reqwest::Client,
    /// Held across a refresh so concurrent enrollments wait for one token request.
    token: Mutex<Option<CachedToken>>,
}

impl Doc24Client {
    pub fn new(config: Doc24Config) -> Result<Self, EnrollmentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EnrollmentError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
            token: Mutex::new(None),
        })
    }

    /// Returns a bearer token, refreshing it when close to expiry.
    async fn bearer_token(&self) -> Result<String, EnrollmentError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(Instant::now()) {
                return Ok(token.value.expose_secret().clone());
            }
        }

        tracing::info!("refreshing Doc24 token");
        let response = self
            .http_client
            .post(format!("{}/authentication", self.config.base_url))
            .json(&AuthenticationRequest {
                client_id: &self.config.client_id,
                client_secret: self.config.client_secret.expose_secret(),
            })
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), error = %body, "Doc24 authentication failed");
            return Err(EnrollmentError::Authentication(format!(
                "status {}",
                status.as_u16()
            )));
        }

        let auth: AuthenticationResponse = response
            .json()
            .await
            .map_err(|e| EnrollmentError::InvalidResponse(e.to_string()))?;

        let ttl = match auth.expires_in {
            0 => DEFAULT_TOKEN_TTL,
            secs => Duration::from_secs(secs),
        };
        let token = auth.access_token.clone();
        *cached = Some(CachedToken {
            value: SecretString::new(auth.access_token),
            expires_at: Instant::now() + ttl,
        });

        Ok(token)
    }
}

#[async_trait]
impl BenefitProvider for Doc24Client {
    fn code(&self) -> ProviderCode {
        ProviderCode::doc24()
    }

    async fn enroll(&self, message: &ActivationMessage) -> Result<Enrollment, EnrollmentError> {
        let token = self.bearer_token().await?;

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let affiliate = Affiliate::from_message(
            message,
            &self.config.empresa,
            &self.config.default_plan_code,
            &today,
        );

        let response = self
            .http_client
            .post(format!("{}/portal/elegibilidad", self.config.base_url))
            .bearer_auth(token)
            .json(&affiliate)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrollmentError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        // The body is informational; success is decided by the status code.
        let result: EligibilityResponse = response.json().await.unwrap_or_default();

        tracing::info!(
            customer_id = %message.customer_id,
            plan = %affiliate.plan,
            estado = result.estado,
            "Doc24 affiliate enrolled"
        );

        Ok(Enrollment {
            provider_member_id: message.cpf.clone(),
        })
    }
}

fn transport_error(e: reqwest::Error) -> EnrollmentError {
    if e.is_timeout() {
        EnrollmentError::Timeout
    } else {
        EnrollmentError::Network(e.to_string())
    }
}
