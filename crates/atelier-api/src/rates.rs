//! Exchange-rate refresh.
//!
//! The rate table starts from the built-in static rates and is refreshed in
//! the background from `RATES_API_URL`. A failed refresh keeps the current
//! table.

use atelier_core::{RatesPayload, RateTable, StoreError, StoreResult};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

pub type SharedRates = Arc<RwLock<RateTable>>;

/// Fetch rates once and merge them into `rates`
#[instrument(skip(client, rates))]
pub async fn refresh_rates(client: &Client, url: &str, rates: &SharedRates) -> StoreResult<usize> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| StoreError::NetworkError(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(StoreError::provider("rates", format!("HTTP {}", status)));
    }

    let payload: RatesPayload = response
        .json()
        .await
        .map_err(|e| StoreError::Serialization(format!("Failed to parse rates: {}", e)))?;

    let source = reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "remote".to_string());

    // Merge into a copy so readers never see a half-updated table
    let mut next = rates.read().await.clone();
    let taken = next.merge_remote(&payload, source)?;
    *rates.write().await = next;

    info!("Refreshed {} exchange rates", taken);
    Ok(taken)
}

/// Refresh now and then every `every`, until the task is aborted
pub fn spawn_refresher(rates: SharedRates, url: String, every: Duration) -> JoinHandle<()> {
    info!("Spawning exchange-rate refresher ({}s)", every.as_secs());
    tokio::spawn(async move {
        let client = match Client::builder().timeout(Duration::from_secs(10)).build() {
            Ok(client) => client,
            Err(e) => {
                warn!("Rates refresher disabled: {}", e);
                return;
            }
        };

        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = refresh_rates(&client, &url, &rates).await {
                warn!("Exchange-rate refresh failed, keeping current table: {}", e);
            }
        }
    })
}
