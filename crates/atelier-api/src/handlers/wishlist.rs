//! Wishlist.

use crate::error::ApiResult;
use crate::extract::CustomerId;
use crate::state::AppState;
use atelier_core::{Product, StoreError, Wishlist};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub product_ids: Vec<String>,
    /// Saved products that are still for sale
    pub products: Vec<Product>,
}

async fn load(state: &AppState, customer_id: &str) -> ApiResult<Wishlist> {
    Ok(state
        .store
        .get_wishlist(customer_id)
        .await?
        .unwrap_or_else(|| Wishlist::new(customer_id)))
}

async fn view(state: &AppState, wishlist: Wishlist) -> ApiResult<Json<WishlistView>> {
    let catalog = state.catalog().await?;
    let products = wishlist
        .product_ids
        .iter()
        .filter_map(|id| catalog.get(id))
        .filter(|p| p.active)
        .cloned()
        .collect();

    Ok(Json(WishlistView {
        product_ids: wishlist.product_ids,
        products,
    }))
}

pub async fn get_wishlist(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
) -> ApiResult<Json<WishlistView>> {
    let wishlist = load(&state, &customer_id).await?;
    view(&state, wishlist).await
}

pub async fn add_to_wishlist(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
    Path(product_id): Path<String>,
) -> ApiResult<Json<WishlistView>> {
    if state.store.get_product(&product_id).await?.is_none() {
        return Err(StoreError::ProductNotFound { product_id }.into());
    }

    let mut wishlist = load(&state, &customer_id).await?;
    if wishlist.add(product_id) {
        state.store.put_wishlist(&wishlist).await?;
    }
    view(&state, wishlist).await
}

pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
    Path(product_id): Path<String>,
) -> ApiResult<Json<WishlistView>> {
    let mut wishlist = load(&state, &customer_id).await?;
    if wishlist.remove(&product_id) {
        state.store.put_wishlist(&wishlist).await?;
    }
    view(&state, wishlist).await
}
