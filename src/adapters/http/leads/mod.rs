//! HTTP adapter for lead capture.
//!
//! - `POST /leads/capture` - Store a visitor's contact, rate limited per IP

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{CaptureLeadRequest, CaptureLeadResponse};
pub use routes::{lead_routes, LEADS_RESOURCE};
