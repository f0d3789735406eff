//! Checkout: order creation, gateway hand-off and client-side completion.

use crate::email::{self, send_logged};
use crate::error::{ApiError, ApiResult};
use crate::extract::CustomerId;
use crate::fulfillment::OrderFulfillment;
use crate::state::AppState;
use atelier_core::{
    price_items, CartItem, CheckoutAction, CheckoutSession, CompletionRequest, Currency,
    CustomerDetails, Order, OrderStatus, PaymentStrategy, Price, StoreError,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

/// Create checkout request
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    /// Billing / shipping details
    pub customer: CustomerDetails,
    /// Payment provider (optional, defaults to "payhere")
    #[serde(default)]
    pub provider: Option<String>,
    /// Items to purchase; the saved cart when empty
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Currency the customer saw prices in
    #[serde(default)]
    pub currency: Option<Currency>,
    /// Total the customer saw, in minor units of `currency`. Checked against
    /// the server price so a stale page cannot be charged a different amount.
    #[serde(default)]
    pub expected_total: Option<i64>,
}

/// Create checkout response
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order_id: String,
    pub order_number: String,
    pub status: OrderStatus,
    /// Amount the gateway will charge
    pub total: Price,
    pub session: CheckoutSession,
}

/// Currency the gateway will be asked to charge in: the one the customer
/// saw when the gateway takes it, else the catalog currency, else the
/// gateway's first currency
fn settlement_currency(strategy: &dyn PaymentStrategy, order: Currency, display: Currency) -> Currency {
    if strategy.settles_in(display) {
        display
    } else if strategy.settles_in(order) {
        order
    } else {
        strategy
            .settlement_currencies()
            .first()
            .copied()
            .unwrap_or(order)
    }
}

/// Create an order and a checkout session with the chosen gateway
#[instrument(skip(state, request), fields(customer = %customer_id, provider = ?request.provider))]
pub async fn create_checkout(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<Json<CheckoutResponse>> {
    request.customer.validate()?;

    let provider = request.provider.as_deref();
    let strategy = state.strategies.get_or_default(provider).ok_or_else(|| {
        StoreError::InvalidRequest(format!(
            "Unknown payment provider: {}",
            provider.unwrap_or("(default)")
        ))
    })?;

    let items = if request.items.is_empty() {
        state
            .carts
            .get(&customer_id)
            .await?
            .map(|cart| cart.items)
            .unwrap_or_default()
    } else {
        request.items
    };
    if items.is_empty() {
        return Err(StoreError::InvalidRequest("Cart is empty".to_string()).into());
    }

    let catalog = state.catalog().await?;
    let priced = price_items(&items, &catalog)?;
    let rates = state.rate_table().await;
    let display = request.currency.unwrap_or(state.config.default_currency);

    let mut order = Order::from_priced_cart(&customer_id, request.customer, &priced);
    order.provider = strategy.provider_name().to_string();

    // Same conversion the order goes through below, so when the gateway
    // settles in the display currency it charges exactly the checked amount
    if let Some(expected) = request.expected_total {
        let shown = order.total_in(&rates, display)?;
        if shown.amount != expected {
            return Err(StoreError::InvalidPrice {
                message: format!(
                    "prices changed: expected {}, now {}",
                    Price::from_minor(expected, display).display(),
                    shown.display()
                ),
            }
            .into());
        }
    }

    let currency = settlement_currency(strategy.as_ref(), order.currency, display);
    order.convert(&rates, currency)?;
    state.store.insert_order(&order).await?;

    info!(
        "Creating checkout: order={}, {} items, total={}, provider={}",
        order.number,
        order.item_count(),
        order.total().display(),
        order.provider
    );

    let session = match strategy.create_checkout(&order, &state.urls).await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to create checkout for {}: {}", order.number, e);
            if order.set_status(OrderStatus::Failed).unwrap_or(false) {
                if let Err(update) = state
                    .store
                    .transition_order(&order, OrderStatus::Pending)
                    .await
                {
                    error!("Failed to mark {} as failed: {}", order.number, update);
                }
            }
            return Err(e.into());
        }
    };

    if let CheckoutAction::BankTransfer { instructions } = &session.action {
        let (updated, _) = OrderFulfillment::new(state.clone())
            .transition(
                &order.id,
                OrderStatus::AwaitingTransfer,
                session.gateway_reference.as_deref(),
            )
            .await?;
        order = updated;
        send_logged(
            state.mailer.as_ref(),
            email::bank_transfer_instructions(&order, instructions),
        )
        .await;
    } else if let Some(reference) = &session.gateway_reference {
        order.gateway_reference = Some(reference.clone());
        // A notification may already have moved the order on; keep its status
        if !state.store.transition_order(&order, OrderStatus::Pending).await? {
            warn!("Order {} changed before its gateway reference was saved", order.number);
        }
    }

    info!("Created {} checkout for order {}", session.provider, order.number);

    Ok(Json(CheckoutResponse {
        order_id: order.id.clone(),
        order_number: order.number.clone(),
        status: order.status,
        total: order.total(),
        session,
    }))
}

/// Finish a payment approved in the browser (PayPal capture, Braintree
/// nonce charge) and apply the result to the order
#[instrument(skip(state, request), fields(customer = %customer_id))]
pub async fn complete_checkout(
    State(state): State<AppState>,
    CustomerId(customer_id): CustomerId,
    Path(order_id): Path<String>,
    Json(request): Json<CompletionRequest>,
) -> ApiResult<Json<Order>> {
    let order = state
        .store
        .get_order(&order_id)
        .await?
        .filter(|o| o.customer_id == customer_id)
        .ok_or_else(|| ApiError::NotFound(format!("Order {}", order_id)))?;

    if order.status != OrderStatus::Pending {
        return Err(StoreError::InvalidTransition {
            from: order.status.to_string(),
            to: OrderStatus::Paid.to_string(),
        }
        .into());
    }

    let strategy = state.strategies.get(&order.provider).ok_or_else(|| {
        StoreError::Configuration(format!("Provider {} is not configured", order.provider))
    })?;

    let event = strategy.complete_payment(&order, &request).await?;
    let order = OrderFulfillment::new(state.clone()).process(&event).await?;

    Ok(Json(order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_gateways::{
        BankTransferConfig, BankTransferStrategy, PayHereConfig, PayHereStrategy, PayPalConfig,
        PayPalStrategy,
    };

    #[test]
    fn test_settlement_currency() {
        let bank = BankTransferStrategy::new(BankTransferConfig {
            account_name: "Atelier (Pvt) Ltd".into(),
            account_number: "0012345678".into(),
            bank_name: "Commercial Bank".into(),
            branch: "Kollupitiya".into(),
            swift: None,
        });
        assert_eq!(settlement_currency(&bank, Currency::LKR, Currency::USD), Currency::LKR);

        let paypal = PayPalStrategy::new(PayPalConfig::new("id", "secret"));
        assert_eq!(settlement_currency(&paypal, Currency::LKR, Currency::EUR), Currency::EUR);
        assert_eq!(settlement_currency(&paypal, Currency::LKR, Currency::INR), Currency::USD);

        let payhere = PayHereStrategy::new(PayHereConfig::new("1221149", "secret"));
        assert_eq!(settlement_currency(&payhere, Currency::LKR, Currency::USD), Currency::USD);
        assert_eq!(settlement_currency(&payhere, Currency::LKR, Currency::GBP), Currency::LKR);
    }
}
