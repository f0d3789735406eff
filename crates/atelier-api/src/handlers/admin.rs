//! Admin endpoints (bearer token).

use crate::error::ApiResult;
use crate::extract::RequireAdmin;
use crate::fulfillment::OrderFulfillment;
use crate::state::AppState;
use atelier_core::{NewProduct, Order, OrderStatus, Product};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};

/// Add a product. Image URLs are the CDN URLs returned by the upload widget.
#[instrument(skip(state, upload), fields(slug = %upload.slug))]
pub async fn create_product(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(upload): Json<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    upload.validate()?;
    let product = upload.into_product();
    state.store.insert_product(&product).await?;

    info!("Added product {} ({})", product.slug, product.price.display());
    Ok((StatusCode::CREATED, Json(product)))
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
    /// Bank slip number, refund id, ...
    #[serde(default)]
    pub reference: Option<String>,
}

/// Move an order by hand: confirm a bank transfer, record a refund, cancel.
/// Marking an order paid has the same effects as a gateway payment.
#[instrument(skip(state, change), fields(status = %change.status))]
pub async fn update_order_status(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(change): Json<StatusChange>,
) -> ApiResult<Json<Order>> {
    let (order, changed) = OrderFulfillment::new(state.clone())
        .transition(&order_id, change.status, change.reference.as_deref())
        .await?;

    if changed {
        info!("Admin moved order {} to {}", order.number, order.status);
    }
    Ok(Json(order))
}
