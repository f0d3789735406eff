//! # Atelier
//!
//! Jewellery storefront API.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables (any gateway left unset is disabled)
//! export PAYHERE_MERCHANT_ID=1211149
//! export PAYHERE_MERCHANT_SECRET=...
//! export API_BASE_URL=https://api.atelier.lk
//!
//! # Run the server
//! atelier
//! ```

use atelier_api::{rates, routes, state::AppState};
use atelier_gateways::notify_endpoints;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    // Print banner
    if !json_logs {
        print_banner();
    }

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Products loaded: {}", state.catalog().await?.products.len());
    info!("Payment providers: {:?}", state.strategies.providers());

    for (provider, url) in notify_endpoints(&state.strategies, &state.urls) {
        info!("Notify URL for {}: {}", provider, url);
    }

    let refresher = state.config.rates_api_url.clone().map(|url| {
        rates::spawn_refresher(state.rates.clone(), url, state.config.rates_refresh)
    });

    let carts = state.carts.clone();

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("💎 Atelier starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("💳 Checkout: POST http://{}/api/v1/checkout", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = refresher {
        handle.abort();
    }
    info!("Saving pending carts");
    carts.flush_all().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

fn print_banner() {
    println!(
        r#"
  💎 Atelier 💎
  ━━━━━━━━━━━━━━━━━━━━━━━
  Jewellery storefront API
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
