//! Request extractors for customer and admin identity.

use crate::error::ApiError;
use crate::state::AppState;
use atelier_gateways::signature::constant_time_eq;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Header carrying the storefront's customer id
pub const CUSTOMER_HEADER: &str = "x-customer-id";

const MAX_CUSTOMER_ID_LEN: usize = 128;

/// Extractor for the calling customer.
///
/// ```rust,ignore
/// async fn my_cart(CustomerId(customer_id): CustomerId) -> impl IntoResponse { .. }
/// ```
#[derive(Debug, Clone)]
pub struct CustomerId(pub String);

impl<S> FromRequestParts<S> for CustomerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CUSTOMER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty() && id.len() <= MAX_CUSTOMER_ID_LEN)
            .map(|id| Self(id.to_string()))
            .ok_or(ApiError::MissingCustomer)
    }
}

/// Extractor that requires `Authorization: Bearer $ADMIN_API_TOKEN`.
///
/// Admin routes are closed while no token is configured.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let expected = state
            .config
            .admin_api_token
            .as_deref()
            .ok_or(ApiError::AdminRequired)?;

        let presented = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(ApiError::AdminRequired)?;

        if constant_time_eq(presented.trim(), expected) {
            Ok(Self)
        } else {
            tracing::warn!("Rejected admin request with a wrong token");
            Err(ApiError::AdminRequired)
        }
    }
}
