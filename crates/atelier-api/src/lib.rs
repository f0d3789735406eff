//! # atelier-api
//!
//! HTTP API for the Atelier jewellery storefront.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for catalog, cart, wishlist, reviews and checkout
//! - Gateway callback handlers that settle orders
//! - Supabase / in-memory persistence, Resend email, exchange-rate refresh
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/v1/products` | Search the catalog |
//! | GET | `/api/v1/products/{id}` | Product by id or slug |
//! | GET/POST | `/api/v1/products/{id}/reviews` | List / add reviews |
//! | GET/PUT/DELETE | `/api/v1/cart` | Read / replace / clear the cart |
//! | POST | `/api/v1/cart/items` | Add to cart |
//! | PATCH/DELETE | `/api/v1/cart/items/{product_id}` | Change quantity / remove |
//! | GET | `/api/v1/wishlist` | Wishlist |
//! | POST/DELETE | `/api/v1/wishlist/{product_id}` | Save / unsave |
//! | GET | `/api/v1/currency/rates` | Exchange rates |
//! | GET | `/api/v1/currency/convert` | Convert an amount |
//! | POST | `/api/v1/checkout` | Create order + checkout session |
//! | POST | `/api/v1/checkout/{order_id}/complete` | PayPal capture / Braintree charge |
//! | GET | `/api/v1/orders` | Customer's orders |
//! | GET | `/api/v1/orders/{order_id}` | One order |
//! | POST | `/api/v1/admin/products` | Add a product |
//! | POST | `/api/v1/admin/orders/{id}/status` | Change an order's status |
//! | POST | `/notify/payhere`, `/notify/payzy` | Gateway callbacks |

pub mod cart_sync;
pub mod email;
pub mod error;
pub mod extract;
pub mod fulfillment;
pub mod handlers;
pub mod rates;
pub mod routes;
pub mod state;
pub mod store;
pub mod supabase;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppConfig, AppState};
pub use store::{MemoryStore, SharedStore, Store};
