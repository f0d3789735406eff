//! Exchange rates and price conversion.

use crate::error::ApiResult;
use crate::state::AppState;
use atelier_core::{Currency, Price, RateTable, StoreError};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

pub async fn get_rates(State(state): State<AppState>) -> Json<RateTable> {
    Json(state.rate_table().await)
}

/// `?amount=12500.00&from=LKR&to=USD`
#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    /// Decimal amount in `from`
    pub amount: String,
    #[serde(default)]
    pub from: Option<Currency>,
    pub to: Currency,
}

#[derive(Debug, Serialize)]
pub struct Conversion {
    pub from: Price,
    pub to: Price,
    /// Formatted target price (e.g. "$42.50")
    pub display: String,
}

/// Convert a price; `from` defaults to the store's base currency
pub async fn convert(
    State(state): State<AppState>,
    Query(query): Query<ConvertQuery>,
) -> ApiResult<Json<Conversion>> {
    let rates = state.rate_table().await;
    let from = Price::parse_decimal(&query.amount, query.from.unwrap_or(rates.base))?;
    if from.amount < 0 {
        return Err(StoreError::InvalidPrice {
            message: "amount must not be negative".to_string(),
        }
        .into());
    }

    let to = rates.convert(&from, query.to)?;
    Ok(Json(Conversion {
        display: to.display(),
        from,
        to,
    }))
}
