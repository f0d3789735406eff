//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::handlers::{self, admin, cart, checkout, currency, notify, orders, products, reviews, wishlist};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Catalog: `/api/v1/products`, `/api/v1/products/{id}`, reviews
/// - Customer (`X-Customer-Id`): cart, wishlist, checkout, orders
/// - Currency: `/api/v1/currency/rates`, `/api/v1/currency/convert`
/// - Admin (bearer token): `/api/v1/admin/*`
/// - Gateway callbacks: `POST /notify/{provider}`
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let catalog_routes = Router::new()
        .route("/products", get(products::list_products))
        .route("/products/{product_id}", get(products::get_product))
        .route(
            "/products/{product_id}/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        );

    let customer_routes = Router::new()
        .route(
            "/cart",
            get(cart::get_cart).put(cart::replace_cart).delete(cart::clear_cart),
        )
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{product_id}",
            axum::routing::patch(cart::update_item).delete(cart::remove_item),
        )
        .route("/wishlist", get(wishlist::get_wishlist))
        .route(
            "/wishlist/{product_id}",
            post(wishlist::add_to_wishlist).delete(wishlist::remove_from_wishlist),
        )
        .route("/checkout", post(checkout::create_checkout))
        .route("/checkout/{order_id}/complete", post(checkout::complete_checkout))
        .route("/orders", get(orders::list_orders))
        .route("/orders/{order_id}", get(orders::get_order));

    let currency_routes = Router::new()
        .route("/rates", get(currency::get_rates))
        .route("/convert", get(currency::convert));

    let admin_routes = Router::new()
        .route("/products", post(admin::create_product))
        .route("/orders/{order_id}/status", post(admin::update_order_status));

    let api_routes = Router::new()
        .merge(catalog_routes)
        .merge(customer_routes)
        .nest("/currency", currency_routes)
        .nest("/admin", admin_routes);

    // Gateway callbacks (raw body, signed by the gateway)
    let notify_routes = Router::new().route("/{provider}", post(notify::gateway_notify));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .nest("/notify", notify_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
