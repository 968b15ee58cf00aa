//! HTTP handlers for checkout endpoints.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::adapters::http::error::{ApiError, ErrorResponse};
use crate::adapters::http::{AppState, JsonBody};
use crate::application::handlers::checkout::{GetCustomerStatusQuery, UserAvailability};
use crate::domain::checkout::{CheckoutForm, CustomerStatus};
use crate::domain::foundation::CustomerId;

use super::dto::{
    CheckoutRequest, CheckoutResponse, CustomerStatusResponse, ValidateUserRequest,
    ValidateUserResponse,
};

/// Error code answered with `409` when the email or CPF is already in use.
pub const USER_EXISTS_CODE: &str = "user_exists";

/// POST /checkout - Charge the customer and record the subscription
pub async fn create_checkout(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let form = CheckoutForm::from(request);
    let result = state.checkout.handle(form).await?;

    Ok((StatusCode::CREATED, Json(CheckoutResponse::from(result))))
}

/// GET /customers/:id/status - Payment status polled by the storefront
///
/// Unknown or malformed ids answer `PENDING`.
pub async fn get_customer_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let status = match id.parse::<CustomerId>() {
        Ok(customer_id) => {
            state
                .customer_status
                .handle(GetCustomerStatusQuery { customer_id })
                .await
        }
        Err(_) => CustomerStatus::Pending,
    };

    Json(CustomerStatusResponse { status })
}

/// POST /validate-user - Duplicate email/CPF check before checkout
pub async fn validate_user(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ValidateUserRequest>,
) -> Result<Response, ApiError> {
    let availability = state.validate_user.handle(request.into()).await?;

    Ok(match availability {
        UserAvailability::Taken => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new(
                USER_EXISTS_CODE,
                "Um usuário com este email ou CPF já existe",
            )),
        )
            .into_response(),
        UserAvailability::Available => Json(ValidateUserResponse {
            status: "ok".to_string(),
        })
        .into_response(),
    })
}
