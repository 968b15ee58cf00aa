//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Capability Ports
//!
//! - `PaymentGateway` - Payer registration and recurring charges
//! - `BenefitProvider` - Enrollment with a benefits provider
//! - `CheckoutValidator` - Pass/fail validation of checkout input
//!
//! ## Persistence Ports
//!
//! - `CustomerRepository`, `SubscriptionRepository`, `DependentRepository`
//! - `PlanRepository` - Read-only catalog lookup
//! - `LeadRepository` - Leads keyed by email
//!
//! ## Messaging Ports
//!
//! - `MessageBroker` - Durable exchanges/queues with manual acknowledgement
//! - `ActivationPublisher` - Enqueues activation messages
//!
//! ## Protection Ports
//!
//! - `RateLimiter` - Fixed-window request limits per client

mod activation_publisher;
mod benefit_provider;
mod checkout_validator;
mod customer_repository;
mod dependent_repository;
mod lead_repository;
mod message_broker;
mod payment_gateway;
mod plan_repository;
mod rate_limiter;
mod readiness;
mod subscription_repository;

pub use activation_publisher::{ActivationPublisher, PublishError};
pub use benefit_provider::{BenefitProvider, Enrollment, EnrollmentError};
pub use checkout_validator::{AcceptAllValidator, CheckoutValidator};
pub use customer_repository::CustomerRepository;
pub use dependent_repository::DependentRepository;
pub use lead_repository::LeadRepository;
pub use message_broker::{
    BrokerError, Delivery, DeliveryTag, ExchangeKind, MessageBroker, OutgoingMessage,
    QueueArguments, QueueTopology,
};
pub use payment_gateway::{
    CardSubscriptionRequest, GatewayCustomer, GatewaySubscription, PaymentError,
    PaymentErrorCode, PaymentGateway, PixArtifact, PixSubscription, PixSubscriptionRequest,
};
pub use plan_repository::PlanRepository;
pub use rate_limiter::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitScope, RateLimiter,
};
pub use readiness::ReadinessCheck;
pub use subscription_repository::SubscriptionRepository;
