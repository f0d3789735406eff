//! API error type.
//!
//! Handlers return `Result<T, ApiError>`; domain failures arrive as
//! `StoreError` and keep its status code.

use atelier_core::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No `X-Customer-Id` on a customer route
    #[error("Customer authentication required")]
    MissingCustomer,

    /// Missing or wrong admin bearer token
    #[error("Admin authentication required")]
    AdminRequired,

    /// Caller is authenticated but the resource belongs to someone else
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Store(err) => err.status_code(),
            ApiError::MissingCustomer | ApiError::AdminRequired => 401,
            ApiError::NotFound(_) => 404,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Don't expose internal error details to clients
        let message = match &self {
            ApiError::Store(
                StoreError::Configuration(_)
                | StoreError::Database(_)
                | StoreError::Internal(_)
                | StoreError::Serialization(_),
            ) => {
                tracing::error!(error = %self, "Request error");
                "Internal server error".to_string()
            }
            _ => {
                if code >= 500 {
                    tracing::error!(error = %self, "Request error");
                }
                self.to_string()
            }
        };

        (status, Json(ErrorResponse::new(message, code))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
