//! Customer order history.

use crate::error::{ApiError, ApiResult};
use crate::extract::CustomerId;
use crate::state::AppState;
use atelier_core::Order;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct OrderList {
    pub orders: Vec<Order>,
    pub count: usize,
}

/// The caller's orders, newest first
pub async fn list_orders(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
) -> ApiResult<Json<OrderList>> {
    let orders = state.store.orders_for_customer(&customer_id).await?;
    Ok(Json(OrderList {
        count: orders.len(),
        orders,
    }))
}

/// One order. Other customers' orders are reported as missing.
pub async fn get_order(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
    Path(order_id): Path<String>,
) -> ApiResult<Json<Order>> {
    state
        .store
        .get_order(&order_id)
        .await?
        .filter(|o| o.customer_id == customer_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Order {}", order_id)))
}
