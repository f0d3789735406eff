//! # Order Fulfillment
//!
//! Applies verified payment outcomes to orders. Gateway notifications,
//! client-side completions (PayPal, Braintree) and admin status changes all
//! end up in `OrderFulfillment::transition`, so a paid order gets the same
//! side effects however it was paid:
//!
//! - stock is decremented for every line
//! - the customer gets a confirmation email
//! - the admin gets a new-order notice (when `ADMIN_EMAIL` is set)
//! - the customer's cart is cleared

use crate::email::{self, send_logged};
use crate::state::AppState;
use async_trait::async_trait;
use atelier_core::{Cart, Order, OrderStatus, PaymentNotification, StoreError, StoreResult};
use atelier_gateways::{dispatch_notification, NotificationHandler};
use tracing::{debug, info, instrument, warn};

/// Status reads before giving up on a contended order
const TRANSITION_ATTEMPTS: usize = 3;

pub struct OrderFulfillment {
    state: AppState,
}

impl OrderFulfillment {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    async fn load(&self, order_id: &str) -> StoreResult<Order> {
        self.state
            .store
            .get_order(order_id)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound {
                order_id: order_id.to_string(),
            })
    }

    /// Apply a verified gateway outcome and return the order as it now stands.
    ///
    /// A notification for another provider or with a different amount is
    /// rejected and leaves the order untouched. Repeats are no-ops.
    #[instrument(skip(self, event), fields(provider = %event.provider, order = %event.order_id, status = ?event.status))]
    pub async fn process(&self, event: &PaymentNotification) -> StoreResult<Order> {
        let order = self.load(&event.order_id).await?;

        if order.provider != event.provider {
            warn!(
                "Notification from {} for order {} placed with {}",
                event.provider, order.number, order.provider
            );
            return Err(StoreError::InvalidRequest(format!(
                "order {} was not paid with {}",
                order.number, event.provider
            )));
        }
        event.check_amount(&order)?;

        dispatch_notification(self, event).await?;
        self.load(&event.order_id).await
    }

    /// Move an order to `next` and run that status's side effects.
    ///
    /// The write is conditional on the status read, so when two deliveries
    /// of the same notification race only one of them sees `changed` and
    /// runs the side effects. Returns the order and whether anything changed.
    pub async fn transition(
        &self,
        order_id: &str,
        next: OrderStatus,
        gateway_reference: Option<&str>,
    ) -> StoreResult<(Order, bool)> {
        let mut attempts = 0;
        let order = loop {
            let mut order = self.load(order_id).await?;
            let from = order.status;
            if !order.set_status(next)? {
                return Ok((order, false));
            }
            if order.gateway_reference.is_none() {
                order.gateway_reference = gateway_reference.map(str::to_string);
            }

            if self.state.store.transition_order(&order, from).await? {
                break order;
            }
            attempts += 1;
            if attempts >= TRANSITION_ATTEMPTS {
                return Err(StoreError::Conflict(format!(
                    "order {} kept changing while moving to {}",
                    order.number, next
                )));
            }
            debug!("Order {} left {} before it could move to {}", order.number, from, next);
        };
        info!("Order {} is now {}", order.number, order.status);

        match next {
            OrderStatus::Paid => self.on_paid(&order).await,
            OrderStatus::AwaitingTransfer => self.notify_admin(&order).await,
            _ => {}
        }
        Ok((order, true))
    }

    async fn on_paid(&self, order: &Order) {
        for item in &order.line_items {
            if let Err(e) = self
                .state
                .store
                .decrement_stock(&item.product_id, item.quantity)
                .await
            {
                warn!("Failed to decrement stock for {}: {}", item.product_id, e);
            }
        }

        send_logged(self.state.mailer.as_ref(), email::order_confirmation(order)).await;
        self.notify_admin(order).await;
        self.state.carts.save(Cart::new(&order.customer_id)).await;
    }

    async fn notify_admin(&self, order: &Order) {
        if let Some(admin) = self.state.config.admin_email.as_deref() {
            send_logged(self.state.mailer.as_ref(), email::admin_new_order(order, admin)).await;
        }
    }

    /// Transition for a gateway event. Late or out-of-order events that the
    /// lifecycle does not allow are logged and acknowledged.
    async fn apply(&self, event: &PaymentNotification, next: OrderStatus) -> StoreResult<()> {
        match self
            .transition(&event.order_id, next, event.gateway_reference.as_deref())
            .await
        {
            Ok(_) => Ok(()),
            Err(StoreError::InvalidTransition { from, to }) => {
                warn!(
                    "Ignoring {} notification for order {}: {} -> {} not allowed",
                    event.provider, event.order_id, from, to
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl NotificationHandler for OrderFulfillment {
    async fn on_succeeded(&self, event: &PaymentNotification) -> StoreResult<()> {
        self.apply(event, OrderStatus::Paid).await
    }

    async fn on_failed(&self, event: &PaymentNotification) -> StoreResult<()> {
        self.apply(event, OrderStatus::Failed).await
    }

    async fn on_cancelled(&self, event: &PaymentNotification) -> StoreResult<()> {
        self.apply(event, OrderStatus::Cancelled).await
    }

    async fn on_charged_back(&self, event: &PaymentNotification) -> StoreResult<()> {
        self.apply(event, OrderStatus::Refunded).await
    }
}
