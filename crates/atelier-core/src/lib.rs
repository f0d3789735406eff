//! # atelier-core
//!
//! Core types and traits for the Atelier jewellery storefront.
//!
//! This crate provides:
//! - `Currency`, `Price` and `RateTable` for money and conversion
//! - `Product`, `ProductCatalog` and `CatalogQuery` for the catalog
//! - `Cart` with server-side pricing
//! - `Order`, `CheckoutSession` and `PaymentNotification` for checkout
//! - `Review` and `Wishlist`
//! - `PaymentStrategy` trait for implementing payment gateways
//! - `StoreError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use atelier_core::{Cart, CartItem, CheckoutUrls, Order, PaymentStrategy};
//!
//! let mut cart = Cart::new("customer-1");
//! cart.add(CartItem::new("emerald-halo-ring", 1))?;
//!
//! // Prices come from the catalog, never from the client
//! let priced = cart.price(&catalog)?;
//! let order = Order::from_priced_cart("customer-1", details, &priced);
//!
//! let session = strategy.create_checkout(&order, &urls).await?;
//! // Hand session.action to the frontend
//! ```

pub mod cart;
pub mod currency;
pub mod error;
pub mod order;
pub mod product;
pub mod review;
pub mod strategy;
pub mod wishlist;

// Re-exports for convenience
pub use cart::{price_items, Cart, CartItem, PricedCart, PricedLine, MAX_LINE_QUANTITY};
pub use currency::{RateTable, RatesPayload};
pub use error::{StoreError, StoreResult};
pub use order::{
    is_valid_email, BankInstructions, CheckoutAction, CheckoutSession, CompletionRequest,
    CustomerDetails, LineItem, Order, OrderStatus, PaymentNotification, PaymentStatus,
};
pub use product::{
    CatalogPage, CatalogQuery, CatalogSort, Currency, NewProduct, Price, Product, ProductCatalog,
    MAX_PRICE_MINOR,
};
pub use review::{NewReview, RatingDistribution, Review, ReviewSummary};
pub use strategy::{BoxedPaymentStrategy, CheckoutUrls, PaymentStrategy, PaymentStrategySelector};
pub use wishlist::Wishlist;
