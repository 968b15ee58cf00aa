//! Checkout error types.
//!
//! Errors split into two kinds. Domain errors are caller-actionable; technical
//! errors are infrastructure faults that monitoring alerts on separately.
//!
//! # HTTP Status Mapping
//!
//! | Error | Kind | HTTP Status |
//! |-------|------|-------------|
//! | ValidationFailed | domain | 400 |
//! | PlanNotFound | domain | 400 |
//! | PaymentFailed | domain | 400 |
//! | Persistence | technical | 500 |
//! | Infrastructure | technical | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Checkout-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// Input rejected by validation.
    ValidationFailed { field: String, message: String },

    /// Requested plan does not exist or is no longer sold.
    PlanNotFound(String),

    /// The gateway refused or failed to create the charge.
    PaymentFailed { reason: String },

    /// A persistence step failed after the charge; compensations have run.
    Persistence { step: String, message: String },

    /// Unexpected infrastructure fault.
    Infrastructure(String),
}

impl CheckoutError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CheckoutError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn plan_not_found(plan_id: impl Into<String>) -> Self {
        CheckoutError::PlanNotFound(plan_id.into())
    }

    pub fn payment_failed(reason: impl Into<String>) -> Self {
        CheckoutError::PaymentFailed {
            reason: reason.into(),
        }
    }

    pub fn persistence(step: impl Into<String>, message: impl Into<String>) -> Self {
        CheckoutError::Persistence {
            step: step.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        CheckoutError::Infrastructure(message.into())
    }

    /// True for caller-actionable errors (400), false for technical ones (500).
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            CheckoutError::ValidationFailed { .. }
                | CheckoutError::PlanNotFound(_)
                | CheckoutError::PaymentFailed { .. }
        )
    }

    pub fn is_technical(&self) -> bool {
        !self.is_domain()
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CheckoutError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            CheckoutError::PlanNotFound(_) => ErrorCode::PlanNotFound,
            CheckoutError::PaymentFailed { .. } => ErrorCode::PaymentFailed,
            CheckoutError::Persistence { .. } => ErrorCode::DatabaseError,
            CheckoutError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    /// Returns a caller-facing message.
    pub fn message(&self) -> String {
        match self {
            CheckoutError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            CheckoutError::PlanNotFound(id) => format!("Plan not found: {}", id),
            CheckoutError::PaymentFailed { reason } => format!("Payment failed: {}", reason),
            CheckoutError::Persistence { step, .. } => {
                format!("Checkout could not be completed (step '{}')", step)
            }
            CheckoutError::Infrastructure(_) => "Internal error".to_string(),
        }
    }
}

impl std::fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutError::Persistence { step, message } => {
                write!(f, "persistence failed at '{}': {}", step, message)
            }
            CheckoutError::Infrastructure(msg) => write!(f, "infrastructure error: {}", msg),
            other => write!(f, "{}", other.message()),
        }
    }
}

impl std::error::Error for CheckoutError {}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::validation(err.field().to_string(), err.to_string())
    }
}

impl From<DomainError> for CheckoutError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => CheckoutError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::PlanNotFound => CheckoutError::PlanNotFound(err.message),
            ErrorCode::PaymentFailed => CheckoutError::PaymentFailed { reason: err.message },
            _ => CheckoutError::Infrastructure(err.to_string()),
        }
    }
}
