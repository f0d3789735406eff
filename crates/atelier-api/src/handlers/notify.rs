//! Gateway callbacks (PayHere `notify_url`, Payzy callback).

use crate::error::{ApiError, ApiResult};
use crate::fulfillment::OrderFulfillment;
use crate::state::AppState;
use atelier_core::StoreError;
use atelier_gateways::NOTIFYING_PROVIDERS;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use tracing::{error, info, instrument};

/// Header some gateways put the signature in; PayHere and Payzy sign inside
/// the body, so it is optional
const SIGNATURE_HEADER: &str = "x-signature";

/// Verify a gateway callback and apply it to the order.
///
/// Once a callback verifies, the gateway gets 200 even for repeats.
/// Bad signatures and amount mismatches are rejected so they show up in the
/// gateway's delivery log.
#[instrument(skip(state, headers, body), fields(len = body.len()))]
pub async fn gateway_notify(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<StatusCode> {
    if !NOTIFYING_PROVIDERS.contains(&provider.as_str()) {
        return Err(StoreError::InvalidRequest(format!("{} does not send notifications", provider)).into());
    }

    let strategy = state
        .strategies
        .get(&provider)
        .ok_or_else(|| ApiError::NotFound(format!("{} is not configured", provider)))?;

    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    let event = strategy
        .verify_notification(&body, signature)
        .await
        .inspect_err(|e| error!("Notification verification failed: {}", e))?;

    info!(
        "Received notification: provider={}, order={}, status={:?}",
        event.provider, event.order_id, event.status
    );

    let order = OrderFulfillment::new(state.clone())
        .process(&event)
        .await
        .inspect_err(|e| error!("Notification for {} rejected: {}", event.order_id, e))?;

    info!("Order {} is {}", order.number, order.status);
    Ok(StatusCode::OK)
}
