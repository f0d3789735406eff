//! Product reviews.

use super::products::find_active;
use crate::error::ApiResult;
use crate::extract::CustomerId;
use crate::state::AppState;
use atelier_core::{NewReview, OrderStatus, Review, ReviewSummary, StoreError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::{info, instrument};

#[derive(Debug, Serialize)]
pub struct ProductReviews {
    pub summary: ReviewSummary,
    pub reviews: Vec<Review>,
}

/// Reviews for a product, newest first, with the rating summary
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<ProductReviews>> {
    let catalog = state.catalog().await?;
    let product = find_active(&catalog, &product_id)?;

    let reviews = state.store.reviews_for_product(&product.id).await?;
    Ok(Json(ProductReviews {
        summary: ReviewSummary::from_reviews(&product.id, &reviews),
        reviews,
    }))
}

/// Submit a review. One per customer per product; reviews from customers
/// with a paid order containing the product are marked as verified.
#[instrument(skip(state, review), fields(customer = %customer_id))]
pub async fn create_review(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
    Path(product_id): Path<String>,
    Json(review): Json<NewReview>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    review.validate()?;

    let catalog = state.catalog().await?;
    let product = find_active(&catalog, &product_id)?;

    if state.store.has_reviewed(&customer_id, &product.id).await? {
        return Err(StoreError::Conflict("You have already reviewed this product".to_string()).into());
    }

    let verified = state
        .store
        .orders_for_customer(&customer_id)
        .await?
        .iter()
        .any(|o| o.status == OrderStatus::Paid && o.contains_product(&product.id));

    let review = review.into_review(&product.id, &customer_id, verified);
    state.store.insert_review(&review).await?;

    info!("Review {} for {} (rating {}, verified {})", review.id, product.id, review.rating, verified);
    Ok((StatusCode::CREATED, Json(review)))
}
