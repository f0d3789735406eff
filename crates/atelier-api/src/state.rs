//! # Application State
//!
//! Shared state for the Axum application.
//! Contains payment strategies, configuration, the store and the rate table.

use crate::cart_sync::{CartSync, DEFAULT_DEBOUNCE};
use crate::email::{LogMailer, ResendMailer, SharedMailer};
use crate::rates::SharedRates;
use crate::store::{MemoryStore, SharedStore};
use crate::supabase::{SupabaseConfig, SupabaseStore};
use atelier_core::{
    CheckoutUrls, Currency, PaymentStrategy, PaymentStrategySelector, ProductCatalog, RateTable,
    StoreResult,
};
use atelier_gateways::{
    BankTransferStrategy, BraintreeStrategy, PayHereStrategy, PayPalStrategy, PayzyStrategy,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Storefront URL (gateway return/cancel pages)
    pub base_url: String,
    /// Public URL of this API (gateway callbacks)
    pub api_base_url: String,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Display currency when the client does not ask for one
    pub default_currency: Currency,
    /// Seed catalog for the in-memory store
    pub catalog_path: Option<String>,
    /// Bearer token for `/api/v1/admin/*`; admin routes are closed when unset
    pub admin_api_token: Option<String>,
    /// Where new-order notices go
    pub admin_email: Option<String>,
    /// Exchange-rate endpoint; static rates only when unset
    pub rates_api_url: Option<String>,
    pub rates_refresh: Duration,
    pub cart_sync_debounce: Duration,
    /// `LOG_FORMAT=json`
    pub json_logs: bool,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Load from environment variables, falling back to the local defaults
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let default_currency = match env_var("DEFAULT_CURRENCY").map(|c| c.parse::<Currency>()) {
            Some(Ok(currency)) => currency,
            Some(Err(e)) => {
                warn!("Ignoring DEFAULT_CURRENCY: {}", e);
                defaults.default_currency
            }
            None => defaults.default_currency,
        };

        Self {
            host: env_var("HOST").unwrap_or(defaults.host),
            port: env_var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            base_url: env_var("BASE_URL").unwrap_or(defaults.base_url),
            api_base_url: env_var("API_BASE_URL").unwrap_or(defaults.api_base_url),
            environment: env_var("ENVIRONMENT").unwrap_or(defaults.environment),
            default_currency,
            catalog_path: env_var("CATALOG_PATH"),
            admin_api_token: env_var("ADMIN_API_TOKEN"),
            admin_email: env_var("ADMIN_EMAIL"),
            rates_api_url: env_var("RATES_API_URL"),
            rates_refresh: env_var("RATES_REFRESH_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.rates_refresh),
            cart_sync_debounce: env_var("CART_SYNC_DEBOUNCE_MS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.cart_sync_debounce),
            json_logs: env_var("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn checkout_urls(&self) -> CheckoutUrls {
        CheckoutUrls::new(&self.base_url, &self.api_base_url)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_url: "http://localhost:3000".to_string(),
            api_base_url: "http://localhost:8080".to_string(),
            environment: "development".to_string(),
            default_currency: Currency::LKR,
            catalog_path: None,
            admin_api_token: None,
            admin_email: None,
            rates_api_url: None,
            rates_refresh: Duration::from_secs(6 * 60 * 60),
            cart_sync_debounce: DEFAULT_DEBOUNCE,
            json_logs: false,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment strategy selector
    pub strategies: PaymentStrategySelector,
    /// System of record
    pub store: SharedStore,
    /// Debounced cart writes
    pub carts: CartSync,
    /// Current exchange rates
    pub rates: SharedRates,
    pub mailer: SharedMailer,
    /// Checkout URLs
    pub urls: CheckoutUrls,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Build state from the environment: Supabase when configured (otherwise
    /// an in-memory store seeded from the catalog file), every gateway whose
    /// credentials are present, Resend when configured.
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let store: SharedStore = match SupabaseConfig::from_env() {
            Some(supabase) => {
                info!("Using Supabase store at {}", supabase.url);
                Arc::new(SupabaseStore::new(supabase))
            }
            None => {
                let catalog = load_product_catalog(config.catalog_path.as_deref())?;
                info!("Using in-memory store ({} products)", catalog.products.len());
                Arc::new(MemoryStore::with_catalog(catalog))
            }
        };

        let mailer: SharedMailer = match ResendMailer::from_env() {
            Some(resend) => Arc::new(resend),
            None => {
                warn!("RESEND_API_KEY not set, emails will only be logged");
                Arc::new(LogMailer)
            }
        };

        Ok(Self::from_parts(
            config,
            store,
            gateways_from_env(),
            mailer,
            RateTable::default(),
        ))
    }

    /// Assemble state from explicit parts
    pub fn from_parts(
        config: AppConfig,
        store: SharedStore,
        strategies: PaymentStrategySelector,
        mailer: SharedMailer,
        rates: RateTable,
    ) -> Self {
        Self {
            carts: CartSync::new(store.clone(), config.cart_sync_debounce),
            urls: config.checkout_urls(),
            rates: Arc::new(RwLock::new(rates)),
            strategies,
            store,
            mailer,
            config,
        }
    }

    /// Current products as a searchable catalog
    pub async fn catalog(&self) -> StoreResult<ProductCatalog> {
        crate::store::load_catalog(self.store.as_ref()).await
    }

    /// Snapshot of the rate table
    pub async fn rate_table(&self) -> RateTable {
        self.rates.read().await.clone()
    }
}

fn register<S: PaymentStrategy + 'static>(
    selector: &mut PaymentStrategySelector,
    name: &str,
    strategy: StoreResult<S>,
) {
    match strategy {
        Ok(s) => {
            info!("Payment provider enabled: {}", name);
            selector.register(Arc::new(s));
        }
        Err(e) => info!("Payment provider {} disabled: {}", name, e),
    }
}

/// Register every gateway whose environment variables are present
pub fn gateways_from_env() -> PaymentStrategySelector {
    let mut selector = PaymentStrategySelector::default();
    register(&mut selector, "payhere", PayHereStrategy::from_env());
    register(&mut selector, "payzy", PayzyStrategy::from_env());
    register(&mut selector, "paypal", PayPalStrategy::from_env());
    register(&mut selector, "braintree", BraintreeStrategy::from_env());
    register(&mut selector, "bank_transfer", BankTransferStrategy::from_env());
    selector
}

/// Load product catalog from config file
fn load_product_catalog(path: Option<&str>) -> anyhow::Result<ProductCatalog> {
    if let Some(path) = path {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path, e))?;
        return ProductCatalog::from_toml(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e));
    }

    let config_paths = [
        "config/products.toml",
        "../config/products.toml",
        "../../config/products.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let catalog = ProductCatalog::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            info!("Loaded {} products from {}", catalog.products.len(), path);
            return Ok(catalog);
        }
    }

    // Return empty catalog if no config found
    warn!("No product catalog found, using empty catalog");
    Ok(ProductCatalog::new())
}
