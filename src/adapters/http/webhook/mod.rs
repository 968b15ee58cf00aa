//! HTTP adapter for gateway payment notifications.

pub mod handlers;
pub mod routes;

pub use handlers::WebhookAck;
pub use routes::webhook_routes;
