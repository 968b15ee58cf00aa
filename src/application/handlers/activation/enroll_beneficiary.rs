//! EnrollBeneficiaryHandler - Enrolls an activated customer with their provider.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::activation::ActivationMessage;
use crate::domain::checkout::ProviderCode;
use crate::ports::{BenefitProvider, CustomerRepository, EnrollmentError};

/// Provider integrations keyed by provider code.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderCode, Arc<dyn BenefitProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under its own code, replacing any previous one.
    pub fn register(mut self, provider: Arc<dyn BenefitProvider>) -> Self {
        self.providers.insert(provider.code(), provider);
        self
    }

    pub fn get(&self, code: &ProviderCode) -> Option<&Arc<dyn BenefitProvider>> {
        self.providers.get(code)
    }

    pub fn codes(&self) -> Vec<&ProviderCode> {
        self.providers.keys().collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.codes())
            .finish()
    }
}

/// Result of processing one activation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    /// Provider accepted the enrollment. `persisted` is false when the
    /// provider id could not be written back to the customer.
    Enrolled {
        provider_member_id: String,
        persisted: bool,
    },
    /// No integration exists for the message's provider code.
    UnsupportedProvider(ProviderCode),
}

/// Routes an activation message to its provider and records the result.
pub struct EnrollBeneficiaryHandler {
    registry: ProviderRegistry,
    customers: Arc<dyn CustomerRepository>,
}

impl EnrollBeneficiaryHandler {
    pub fn new(registry: ProviderRegistry, customers: Arc<dyn CustomerRepository>) -> Self {
        Self {
            registry,
            customers,
        }
    }

    /// # Errors
    ///
    /// Returns the provider's error when enrollment fails. Failure to store
    /// the provider id is not an error.
    pub async fn handle(
        &self,
        message: &ActivationMessage,
    ) -> Result<EnrollmentOutcome, EnrollmentError> {
        // 1. Route by provider code
        let Some(provider) = self.registry.get(&message.provider) else {
            tracing::warn!(
                customer_id = %message.customer_id,
                provider = %message.provider,
                "no integration for provider, skipping"
            );
            return Ok(EnrollmentOutcome::UnsupportedProvider(message.provider.clone()));
        };

        // 2. Enroll
        let enrollment = provider.enroll(message).await?;
        tracing::info!(
            customer_id = %message.customer_id,
            provider = %message.provider,
            provider_member_id = %enrollment.provider_member_id,
            "beneficiary enrolled"
        );

        // 3. Store the provider id (best effort)
        let persisted = match self
            .customers
            .update_provider_id(&message.customer_id, &enrollment.provider_member_id)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    customer_id = %message.customer_id,
                    error = %e,
                    "enrolled but failed to store provider id"
                );
                false
            }
        };

        Ok(EnrollmentOutcome::Enrolled {
            provider_member_id: enrollment.provider_member_id,
            persisted,
        })
    }
}
