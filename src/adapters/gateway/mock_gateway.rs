//! Mock payment gateway for testing.
//!
//! Configurable implementation of `PaymentGateway` for unit and integration
//! tests. Supports:
//! - Deterministic ids (`cus_mock_N`, `sub_mock_N`)
//! - Error injection per method
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::ports::{
    CardSubscriptionRequest, GatewayCustomer, GatewaySubscription, PaymentError, PaymentGateway,
    PixArtifact, PixSubscription, PixSubscriptionRequest,
};

/// Mock payment gateway.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new();
/// gateway.fail_method("subscribe_pix", PaymentError::provider("pix unavailable"));
/// ```
#[derive(Default, Clone)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    next_id: u32,
    card_status: Option<String>,
    method_errors: HashMap<&'static str, PaymentError>,
    call_log: Vec<GatewayCall>,
    cancelled: Vec<String>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCall {
    pub method: &'static str,
    pub amount_cents: Option<i64>,
    pub reference: String,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Makes `method` fail with `error` on every call.
    ///
    /// Methods: `create_customer`, `subscribe`, `subscribe_pix`, `cancel_subscription`.
    pub fn fail_method(&self, method: &'static str, error: PaymentError) {
        self.state().method_errors.insert(method, error);
    }

    /// Status reported for card subscriptions (default `ACTIVE`).
    pub fn set_card_status(&self, status: impl Into<String>) {
        self.state().card_status = Some(status.into());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Inspection Methods
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state().call_log.clone()
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Subscription ids passed to `cancel_subscription` successfully.
    pub fn cancelled(&self) -> Vec<String> {
        self.state().cancelled.clone()
    }

    fn record(
        &self,
        method: &'static str,
        amount_cents: Option<i64>,
        reference: &str,
    ) -> Result<u32, PaymentError> {
        let mut state = self.state();
        state.call_log.push(GatewayCall {
            method,
            amount_cents,
            reference: reference.to_string(),
        });
        if let Some(err) = state.method_errors.get(method) {
            return Err(err.clone());
        }
        state.next_id += 1;
        Ok(state.next_id)
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_customer(&self, profile: &GatewayCustomer) -> Result<String, PaymentError> {
        let n = self.record("create_customer", None, &profile.cpf_cnpj)?;
        Ok(format!("cus_mock_{}", n))
    }

    async fn subscribe(
        &self,
        request: &CardSubscriptionRequest,
    ) -> Result<GatewaySubscription, PaymentError> {
        let n = self.record(
            "subscribe",
            Some(request.amount_cents),
            &request.external_customer_id,
        )?;
        let status = self
            .state()
            .card_status
            .clone()
            .unwrap_or_else(|| "ACTIVE".to_string());
        Ok(GatewaySubscription {
            id: format!("sub_mock_{}", n),
            status,
        })
    }

    async fn subscribe_pix(
        &self,
        request: &PixSubscriptionRequest,
    ) -> Result<PixSubscription, PaymentError> {
        let n = self.record(
            "subscribe_pix",
            Some(request.amount_cents),
            &request.external_customer_id,
        )?;
        Ok(PixSubscription {
            id: format!("sub_mock_{}", n),
            pix: PixArtifact {
                copy_paste: format!("00020126580014br.gov.bcb.pix{:04}", n),
                qr_code_url: format!("data:image/png;base64,UVJDT0RF{}", n),
            },
        })
    }

    async fn cancel_subscription(&self, external_subscription_id: &str) -> Result<(), PaymentError> {
        self.record("cancel_subscription", None, external_subscription_id)?;
        self.state()
            .cancelled
            .push(external_subscription_id.to_string());
        Ok(())
    }
}
