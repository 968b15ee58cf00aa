//! HTTP DTOs for lead capture.

use serde::{Deserialize, Serialize};

use crate::application::handlers::checkout::CaptureLeadCommand;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CaptureLeadRequest {
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl From<CaptureLeadRequest> for CaptureLeadCommand {
    fn from(req: CaptureLeadRequest) -> Self {
        CaptureLeadCommand {
            email: req.email,
            name: req.name,
            phone: req.phone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureLeadResponse {
    pub success: bool,
}
