//! Supabase (PostgREST) implementation of `Store`.
//!
//! Each table holds the serialized domain type, one column per field:
//!
//! | table       | key           |
//! |-------------|---------------|
//! | `products`  | `id`          |
//! | `orders`    | `id`          |
//! | `carts`     | `customer_id` |
//! | `wishlists` | `customer_id` |
//! | `reviews`   | `id`          |

use crate::store::Store;
use async_trait::async_trait;
use atelier_core::{Cart, Order, OrderStatus, Product, Review, StoreError, StoreResult, Wishlist};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, instrument, warn};

/// Attempts at a conditional stock update before giving up
const STOCK_UPDATE_ATTEMPTS: usize = 5;

/// Supabase project credentials
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL (e.g. `https://xyzcompany.supabase.co`)
    pub url: String,
    /// Service role key; bypasses row level security
    pub service_key: String,
}

impl SupabaseConfig {
    /// `SUPABASE_URL` and `SUPABASE_SERVICE_KEY`; `None` when either is unset
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("SUPABASE_URL").ok().filter(|v| !v.trim().is_empty())?;
        let service_key = std::env::var("SUPABASE_SERVICE_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())?;
        Some(Self::new(url, service_key))
    }

    pub fn new(url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        }
    }
}

pub struct SupabaseStore {
    config: SupabaseConfig,
    client: Client,
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

impl SupabaseStore {
    pub fn new(config: SupabaseConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn table(&self, method: reqwest::Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{}", self.config.url, table))
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("Supabase error: status={}, body={}", status, body);
        if status == StatusCode::CONFLICT {
            return Err(StoreError::Conflict(body));
        }
        Err(StoreError::Database(format!("HTTP {}: {}", status, body)))
    }

    async fn rows<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<Vec<T>> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Database(format!("Failed to decode rows: {}", e)))
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, filters: &[(&str, String)]) -> StoreResult<Vec<T>> {
        let request = self
            .table(reqwest::Method::GET, table)
            .query(&[("select", "*")])
            .query(filters);
        self.rows(request).await
    }

    async fn select_one<T: DeserializeOwned>(&self, table: &str, column: &str, value: &str) -> StoreResult<Option<T>> {
        let mut rows = self
            .select(table, &[(column, eq(value)), ("limit", "1".to_string())])
            .await?;
        Ok(rows.pop())
    }

    async fn insert<T: Serialize + ?Sized>(&self, table: &str, row: &T) -> StoreResult<()> {
        let request = self
            .table(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .json(row);
        self.send(request).await.map(|_| ())
    }

    async fn upsert<T: Serialize + ?Sized>(&self, table: &str, key: &str, row: &T) -> StoreResult<()> {
        let request = self
            .table(reqwest::Method::POST, table)
            .query(&[("on_conflict", key)])
            .header("Prefer", "resolution=merge-duplicates")
            .json(row);
        self.send(request).await.map(|_| ())
    }

    /// PATCH the rows matching every filter; returns how many were updated.
    ///
    /// PostgREST applies the filters and the write in one statement, so a
    /// filter on the old value makes this a compare-and-set.
    async fn update<T: Serialize + ?Sized>(&self, table: &str, filters: &[(&str, String)], patch: &T) -> StoreResult<usize> {
        let request = self
            .table(reqwest::Method::PATCH, table)
            .query(filters)
            .header("Prefer", "return=representation")
            .json(patch);
        let rows: Vec<serde_json::Value> = self.rows(request).await?;
        Ok(rows.len())
    }
}

#[async_trait]
impl Store for SupabaseStore {
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        self.select("products", &[]).await
    }

    async fn get_product(&self, id: &str) -> StoreResult<Option<Product>> {
        self.select_one("products", "id", id).await
    }

    #[instrument(skip(self, product), fields(slug = %product.slug))]
    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        self.insert("products", product).await
    }

    async fn decrement_stock(&self, product_id: &str, quantity: u32) -> StoreResult<()> {
        for _ in 0..STOCK_UPDATE_ATTEMPTS {
            let product = self
                .get_product(product_id)
                .await?
                .ok_or_else(|| StoreError::ProductNotFound {
                    product_id: product_id.to_string(),
                })?;
            let stock = product.stock.saturating_sub(quantity);
            let filters = [
                ("id", eq(product_id)),
                ("stock", eq(&product.stock.to_string())),
            ];
            if self
                .update("products", &filters, &serde_json::json!({ "stock": stock }))
                .await?
                > 0
            {
                debug!("Stock for {} now {}", product_id, stock);
                return Ok(());
            }
            warn!("Stock for {} changed concurrently, retrying", product_id);
        }
        Err(StoreError::Database(format!(
            "stock for {} kept changing during update",
            product_id
        )))
    }

    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        self.insert("orders", order).await
    }

    async fn get_order(&self, id: &str) -> StoreResult<Option<Order>> {
        self.select_one("orders", "id", id).await
    }

    async fn update_order(&self, order: &Order) -> StoreResult<()> {
        match self.update("orders", &[("id", eq(&order.id))], order).await? {
            0 => Err(StoreError::OrderNotFound {
                order_id: order.id.clone(),
            }),
            _ => Ok(()),
        }
    }

    #[instrument(skip(self, order), fields(order = %order.number, to = %order.status))]
    async fn transition_order(&self, order: &Order, from: OrderStatus) -> StoreResult<bool> {
        let filters = [("id", eq(&order.id)), ("status", eq(from.as_str()))];
        if self.update("orders", &filters, order).await? > 0 {
            return Ok(true);
        }
        // Zero rows: either the status moved on or the order is gone
        match self.get_order(&order.id).await? {
            Some(_) => Ok(false),
            None => Err(StoreError::OrderNotFound {
                order_id: order.id.clone(),
            }),
        }
    }

    async fn orders_for_customer(&self, customer_id: &str) -> StoreResult<Vec<Order>> {
        self.select(
            "orders",
            &[
                ("customer_id", eq(customer_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn get_cart(&self, customer_id: &str) -> StoreResult<Option<Cart>> {
        self.select_one("carts", "customer_id", customer_id).await
    }

    async fn put_cart(&self, cart: &Cart) -> StoreResult<()> {
        self.upsert("carts", "customer_id", cart).await
    }

    async fn delete_cart(&self, customer_id: &str) -> StoreResult<()> {
        let request = self
            .table(reqwest::Method::DELETE, "carts")
            .query(&[("customer_id", eq(customer_id))]);
        self.send(request).await.map(|_| ())
    }

    async fn get_wishlist(&self, customer_id: &str) -> StoreResult<Option<Wishlist>> {
        self.select_one("wishlists", "customer_id", customer_id).await
    }

    async fn put_wishlist(&self, wishlist: &Wishlist) -> StoreResult<()> {
        self.upsert("wishlists", "customer_id", wishlist).await
    }

    async fn reviews_for_product(&self, product_id: &str) -> StoreResult<Vec<Review>> {
        self.select(
            "reviews",
            &[
                ("product_id", eq(product_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn insert_review(&self, review: &Review) -> StoreResult<()> {
        self.insert("reviews", review).await
    }

    async fn has_reviewed(&self, customer_id: &str, product_id: &str) -> StoreResult<bool> {
        let rows: Vec<serde_json::Value> = self
            .rows(
                self.table(reqwest::Method::GET, "reviews")
                    .query(&[
                        ("select", "id".to_string()),
                        ("customer_id", eq(customer_id)),
                        ("product_id", eq(product_id)),
                        ("limit", "1".to_string()),
                    ]),
            )
            .await?;
        Ok(!rows.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::{Currency, Price};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer) -> SupabaseStore {
        SupabaseStore::new(SupabaseConfig::new(server.uri(), "service-key"))
    }

    #[tokio::test]
    async fn test_get_product_filters_by_id() {
        let server = MockServer::start().await;
        let product = Product::new("p1", "Pearl Necklace", "necklaces", Price::new(48_000.0, Currency::LKR));

        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .and(query_param("id", "eq.p1"))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([product])))
            .mount(&server)
            .await;

        let found = store(&server).get_product("p1").await.unwrap().unwrap();
        assert_eq!(found.name, "Pearl Necklace");
        assert_eq!(found.price, Price::new(48_000.0, Currency::LKR));
    }

    #[tokio::test]
    async fn test_missing_row_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        assert!(store(&server).get_order("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cart_upsert_merges_duplicates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/carts"))
            .and(query_param("on_conflict", "customer_id"))
            .and(header("prefer", "resolution=merge-duplicates"))
            .and(body_partial_json(json!({ "customer_id": "cust-1" })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        store(&server).put_cart(&Cart::new("cust-1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_errors_map_to_store_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/reviews"))
            .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let s = store(&server);
        let review = atelier_core::NewReview {
            author: "A".into(),
            rating: 4,
            title: String::new(),
            body: "Lovely finish on the clasp.".into(),
        }
        .into_review("p1", "cust-1", false);

        assert!(matches!(s.insert_review(&review).await, Err(StoreError::Conflict(_))));
        assert!(matches!(s.list_products().await, Err(StoreError::Database(_))));
    }

    fn order() -> Order {
        Order::new(
            "cust-1",
            atelier_core::CustomerDetails {
                first_name: "A".into(),
                last_name: "B".into(),
                email: "a@b.lk".into(),
                phone: String::new(),
                address: String::new(),
                city: String::new(),
                country: "LK".into(),
            },
            Currency::LKR,
        )
    }

    #[tokio::test]
    async fn test_transition_filters_on_current_status() {
        let server = MockServer::start().await;
        let mut paid = order();
        paid.set_status(OrderStatus::Paid).unwrap();

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/orders"))
            .and(query_param("id", format!("eq.{}", paid.id)))
            .and(query_param("status", "eq.pending"))
            .and(body_partial_json(json!({ "status": "paid" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([paid])))
            .expect(1)
            .mount(&server)
            .await;

        assert!(store(&server)
            .transition_order(&paid, OrderStatus::Pending)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_transition_lost_to_another_writer() {
        let server = MockServer::start().await;
        let mut paid = order();
        paid.set_status(OrderStatus::Paid).unwrap();

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([paid])))
            .mount(&server)
            .await;

        assert!(!store(&server)
            .transition_order(&paid, OrderStatus::Pending)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_decrement_stock_is_conditional() {
        let server = MockServer::start().await;
        let product = Product::new("p1", "Pearl Necklace", "necklaces", Price::new(48_000.0, Currency::LKR))
            .with_stock(3);

        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([product])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/products"))
            .and(query_param("id", "eq.p1"))
            .and(query_param("stock", "eq.3"))
            .and(body_partial_json(json!({ "stock": 1 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "p1" }])))
            .expect(1)
            .mount(&server)
            .await;

        store(&server).decrement_stock("p1", 2).await.unwrap();
    }

    #[tokio::test]
    async fn test_decrement_stock_gives_up_under_contention() {
        let server = MockServer::start().await;
        let product = Product::new("p1", "Pearl Necklace", "necklaces", Price::new(48_000.0, Currency::LKR))
            .with_stock(3);

        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([product])))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(STOCK_UPDATE_ATTEMPTS as u64)
            .mount(&server)
            .await;

        assert!(matches!(
            store(&server).decrement_stock("p1", 1).await,
            Err(StoreError::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_update_order_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        assert!(matches!(
            store(&server).update_order(&order()).await,
            Err(StoreError::OrderNotFound { .. })
        ));
    }
}
