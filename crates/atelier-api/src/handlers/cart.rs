//! Customer cart. Writes go through `CartSync` and reach the store after
//! the debounce window; reads always see the latest cart.

use crate::error::ApiResult;
use crate::extract::CustomerId;
use crate::state::AppState;
use atelier_core::{Cart, CartItem, PricedCart, ProductCatalog};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct CartView {
    pub cart: Cart,
    /// Server prices; absent when a line no longer prices (product removed
    /// or out of stock)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priced: Option<PricedCart>,
}

impl CartView {
    fn new(cart: Cart, catalog: &ProductCatalog) -> Self {
        let priced = cart.price(catalog).ok();
        Self { cart, priced }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReplaceCartRequest {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
    #[serde(default)]
    pub variant: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VariantQuery {
    #[serde(default)]
    pub variant: Option<String>,
}

async fn current_cart(state: &AppState, customer_id: &str) -> ApiResult<Cart> {
    Ok(state
        .carts
        .get(customer_id)
        .await?
        .unwrap_or_else(|| Cart::new(customer_id)))
}

/// Price the cart against the catalog (rejects unknown, inactive and
/// out-of-stock products), then queue the write.
async fn save(state: &AppState, cart: Cart) -> ApiResult<Json<CartView>> {
    let catalog = state.catalog().await?;
    let priced = cart.price(&catalog)?;
    debug!("Cart for {} now {} items", cart.customer_id, cart.item_count());
    state.carts.save(cart.clone()).await;
    Ok(Json(CartView {
        cart,
        priced: Some(priced),
    }))
}

pub async fn get_cart(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
) -> ApiResult<Json<CartView>> {
    let cart = current_cart(&state, &customer_id).await?;
    let catalog = state.catalog().await?;
    Ok(Json(CartView::new(cart, &catalog)))
}

/// Replace the cart with the client's copy
pub async fn replace_cart(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
    Json(request): Json<ReplaceCartRequest>,
) -> ApiResult<Json<CartView>> {
    let mut cart = current_cart(&state, &customer_id).await?;
    cart.replace_items(request.items)?;
    save(&state, cart).await
}

pub async fn clear_cart(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
) -> ApiResult<StatusCode> {
    state.carts.save(Cart::new(&customer_id)).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_item(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
    Json(item): Json<CartItem>,
) -> ApiResult<Json<CartView>> {
    let mut cart = current_cart(&state, &customer_id).await?;
    cart.add(item)?;
    save(&state, cart).await
}

/// Set a line's quantity; zero removes it
pub async fn update_item(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
    Path(product_id): Path<String>,
    Json(request): Json<UpdateQuantityRequest>,
) -> ApiResult<Json<CartView>> {
    let mut cart = current_cart(&state, &customer_id).await?;
    cart.set_quantity(&product_id, request.variant.as_deref(), request.quantity)?;
    save(&state, cart).await
}

pub async fn remove_item(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
    Path(product_id): Path<String>,
    Query(query): Query<VariantQuery>,
) -> ApiResult<Json<CartView>> {
    let mut cart = current_cart(&state, &customer_id).await?;
    cart.remove(&product_id, query.variant.as_deref())?;
    save(&state, cart).await
}
