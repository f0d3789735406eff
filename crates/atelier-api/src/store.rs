//! # Persistence
//!
//! `Store` is the system of record for products, orders, carts, wishlists
//! and reviews. `MemoryStore` backs development and tests; `SupabaseStore`
//! (see `supabase.rs`) talks to Supabase over PostgREST.

use async_trait::async_trait;
use atelier_core::{
    Cart, Order, OrderStatus, Product, ProductCatalog, Review, StoreError, StoreResult, Wishlist,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Storage backend
#[async_trait]
pub trait Store: Send + Sync {
    // Products
    async fn list_products(&self) -> StoreResult<Vec<Product>>;
    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>>;
    async fn insert_product(&self, product: &Product) -> StoreResult<()>;
    /// Lower stock after a sale, stopping at zero
    async fn decrement_stock(&self, product_id: &str, quantity: u32) -> StoreResult<()>;

    // Orders
    async fn insert_order(&self, order: &Order) -> StoreResult<()>;
    async fn get_order(&self, id: &str) -> StoreResult<Option<Order>>;
    async fn update_order(&self, order: &Order) -> StoreResult<()>;
    /// Write `order` only if the stored copy is still in status `from`.
    ///
    /// Returns `false` when another writer moved the order first; nothing is
    /// written in that case.
    async fn transition_order(&self, order: &Order, from: OrderStatus) -> StoreResult<bool>;
    /// Newest first
    async fn orders_for_customer(&self, customer_id: &str) -> StoreResult<Vec<Order>>;

    // Carts
    async fn get_cart(&self, customer_id: &str) -> StoreResult<Option<Cart>>;
    async fn put_cart(&self, cart: &Cart) -> StoreResult<()>;
    async fn delete_cart(&self, customer_id: &str) -> StoreResult<()>;

    // Wishlists
    async fn get_wishlist(&self, customer_id: &str) -> StoreResult<Option<Wishlist>>;
    async fn put_wishlist(&self, wishlist: &Wishlist) -> StoreResult<()>;

    // Reviews
    /// Newest first
    async fn reviews_for_product(&self, product_id: &str) -> StoreResult<Vec<Review>>;
    async fn insert_review(&self, review: &Review) -> StoreResult<()>;
    async fn has_reviewed(&self, customer_id: &str, product_id: &str) -> StoreResult<bool>;
}

pub type SharedStore = Arc<dyn Store>;

/// Snapshot of the product table as a searchable catalog
pub async fn load_catalog(store: &dyn Store) -> StoreResult<ProductCatalog> {
    Ok(ProductCatalog::from_products(store.list_products().await?))
}

/// In-memory store
#[derive(Default)]
pub struct MemoryStore {
    products: RwLock<Vec<Product>>,
    orders: RwLock<HashMap<String, Order>>,
    carts: RwLock<HashMap<String, Cart>>,
    wishlists: RwLock<HashMap<String, Wishlist>>,
    reviews: RwLock<Vec<Review>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a catalog
    pub fn with_catalog(catalog: ProductCatalog) -> Self {
        Self {
            products: RwLock::new(catalog.products),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.products.read().await.clone())
    }

    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.products.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        let mut products = self.products.write().await;
        if products.iter().any(|p| p.id == product.id || p.slug == product.slug) {
            return Err(StoreError::Conflict(format!(
                "product with slug {} already exists",
                product.slug
            )));
        }
        products.push(product.clone());
        Ok(())
    }

    async fn decrement_stock(&self, product_id: &str, quantity: u32) -> StoreResult<()> {
        let mut products = self.products.write().await;
        let product = products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or_else(|| StoreError::ProductNotFound {
                product_id: product_id.to_string(),
            })?;
        product.stock = product.stock.saturating_sub(quantity);
        Ok(())
    }

    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        self.orders.write().await.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn get_order(&self, id: &str) -> StoreResult<Option<Order>> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn update_order(&self, order: &Order) -> StoreResult<()> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(())
            }
            None => Err(StoreError::OrderNotFound {
                order_id: order.id.clone(),
            }),
        }
    }

    async fn transition_order(&self, order: &Order, from: OrderStatus) -> StoreResult<bool> {
        let mut orders = self.orders.write().await;
        let existing = orders
            .get_mut(&order.id)
            .ok_or_else(|| StoreError::OrderNotFound {
                order_id: order.id.clone(),
            })?;
        if existing.status != from {
            return Ok(false);
        }
        *existing = order.clone();
        Ok(true)
    }

    async fn orders_for_customer(&self, customer_id: &str) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn get_cart(&self, customer_id: &str) -> StoreResult<Option<Cart>> {
        Ok(self.carts.read().await.get(customer_id).cloned())
    }

    async fn put_cart(&self, cart: &Cart) -> StoreResult<()> {
        self.carts
            .write()
            .await
            .insert(cart.customer_id.clone(), cart.clone());
        Ok(())
    }

    async fn delete_cart(&self, customer_id: &str) -> StoreResult<()> {
        self.carts.write().await.remove(customer_id);
        Ok(())
    }

    async fn get_wishlist(&self, customer_id: &str) -> StoreResult<Option<Wishlist>> {
        Ok(self.wishlists.read().await.get(customer_id).cloned())
    }

    async fn put_wishlist(&self, wishlist: &Wishlist) -> StoreResult<()> {
        self.wishlists
            .write()
            .await
            .insert(wishlist.customer_id.clone(), wishlist.clone());
        Ok(())
    }

    async fn reviews_for_product(&self, product_id: &str) -> StoreResult<Vec<Review>> {
        let mut reviews: Vec<Review> = self
            .reviews
            .read()
            .await
            .iter()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn insert_review(&self, review: &Review) -> StoreResult<()> {
        let mut reviews = self.reviews.write().await;
        let duplicate = reviews
            .iter()
            .any(|r| r.customer_id == review.customer_id && r.product_id == review.product_id);
        if duplicate {
            return Err(StoreError::Conflict(
                "you have already reviewed this product".to_string(),
            ));
        }
        reviews.push(review.clone());
        Ok(())
    }

    async fn has_reviewed(&self, customer_id: &str, product_id: &str) -> StoreResult<bool> {
        Ok(self
            .reviews
            .read()
            .await
            .iter()
            .any(|r| r.customer_id == customer_id && r.product_id == product_id))
    }
}
