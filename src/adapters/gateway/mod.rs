//! Payment gateway adapters.

mod asaas_adapter;
mod asaas_types;
mod mock_gateway;

pub use asaas_adapter::{AsaasConfig, AsaasGateway};
pub use mock_gateway::MockPaymentGateway;
