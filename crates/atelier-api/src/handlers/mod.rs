//! # Request Handlers
//!
//! Axum request handlers, one module per resource.

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod currency;
pub mod notify;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod wishlist;

use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let rates = state.rates.read().await;
    Json(serde_json::json!({
        "status": "healthy",
        "service": "atelier",
        "version": env!("CARGO_PKG_VERSION"),
        "providers": state.strategies.providers(),
        "rates": {
            "source": rates.source,
            "updated_at": rates.updated_at,
        },
        "time": chrono::Utc::now(),
    }))
}
