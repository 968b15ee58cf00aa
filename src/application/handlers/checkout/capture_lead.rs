//! CaptureLeadHandler - Stores a visitor's contact before checkout.

use std::sync::Arc;

use crate::domain::checkout::{CheckoutError, Lead};
use crate::ports::LeadRepository;

/// Contact fields posted by the storefront.
#[derive(Debug, Clone, Default)]
pub struct CaptureLeadCommand {
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Upserts a lead by email.
pub struct CaptureLeadHandler {
    leads: Arc<dyn LeadRepository>,
}

impl CaptureLeadHandler {
    pub fn new(leads: Arc<dyn LeadRepository>) -> Self {
        Self { leads }
    }

    pub async fn handle(&self, cmd: CaptureLeadCommand) -> Result<Lead, CheckoutError> {
        let lead = Lead::new(&cmd.email, cmd.name.as_deref(), cmd.phone.as_deref())?;

        self.leads.upsert(&lead).await.map_err(|e| {
            tracing::error!(error = %e, "lead capture failed");
            CheckoutError::persistence("upsert_lead", e.to_string())
        })?;

        tracing::info!(email = %lead.email, "lead captured");
        Ok(lead)
    }
}
