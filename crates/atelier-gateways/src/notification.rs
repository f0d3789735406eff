//! # Payment Outcome Handling
//!
//! Verified gateway results (PayHere/Payzy notifications, PayPal captures,
//! Braintree charges) all arrive as a `PaymentNotification`. Implement
//! `NotificationHandler` to act on them and route with `dispatch_notification`.

use async_trait::async_trait;
use atelier_core::{CheckoutUrls, PaymentNotification, PaymentStatus, PaymentStrategySelector, StoreResult};
use tracing::{info, warn};

/// Providers that report outcomes by calling our notify endpoint
pub const NOTIFYING_PROVIDERS: &[&str] = &["payhere", "payzy"];

/// Payment outcome handler
///
/// Every method defaults to logging the event.
#[async_trait]
#[allow(unused_variables)]
pub trait NotificationHandler: Send + Sync {
    /// Money captured
    async fn on_succeeded(&self, event: &PaymentNotification) -> StoreResult<()> {
        info!(
            "Payment succeeded: provider={}, order={}, reference={:?}",
            event.provider, event.order_id, event.gateway_reference
        );
        Ok(())
    }

    /// Gateway accepted the payment but has not settled it yet
    async fn on_pending(&self, event: &PaymentNotification) -> StoreResult<()> {
        info!("Payment pending: provider={}, order={}", event.provider, event.order_id);
        Ok(())
    }

    async fn on_failed(&self, event: &PaymentNotification) -> StoreResult<()> {
        warn!("Payment failed: provider={}, order={}", event.provider, event.order_id);
        Ok(())
    }

    async fn on_cancelled(&self, event: &PaymentNotification) -> StoreResult<()> {
        info!("Payment cancelled: provider={}, order={}", event.provider, event.order_id);
        Ok(())
    }

    async fn on_charged_back(&self, event: &PaymentNotification) -> StoreResult<()> {
        warn!("Payment charged back: provider={}, order={}", event.provider, event.order_id);
        Ok(())
    }
}

/// Handler that only logs
pub struct LoggingNotificationHandler;

impl NotificationHandler for LoggingNotificationHandler {}

/// Route a verified notification to the handler method for its status
pub async fn dispatch_notification(
    handler: &dyn NotificationHandler,
    event: &PaymentNotification,
) -> StoreResult<()> {
    match event.status {
        PaymentStatus::Succeeded => handler.on_succeeded(event).await,
        PaymentStatus::Pending => handler.on_pending(event).await,
        PaymentStatus::Failed => handler.on_failed(event).await,
        PaymentStatus::Cancelled => handler.on_cancelled(event).await,
        PaymentStatus::ChargedBack => handler.on_charged_back(event).await,
    }
}

/// Notify URLs to configure in each registered gateway's merchant portal
pub fn notify_endpoints(selector: &PaymentStrategySelector, urls: &CheckoutUrls) -> Vec<(String, String)> {
    NOTIFYING_PROVIDERS
        .iter()
        .filter_map(|name| selector.get(name))
        .map(|s| (s.provider_name().to_string(), urls.notify_url(s.as_ref())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PayHereConfig, PayPalConfig};
    use crate::payhere::PayHereStrategy;
    use crate::paypal::PayPalStrategy;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingHandler {
        succeeded: AtomicU32,
        failed: AtomicU32,
    }

    #[async_trait]
    impl NotificationHandler for CountingHandler {
        async fn on_succeeded(&self, _event: &PaymentNotification) -> StoreResult<()> {
            self.succeeded.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn on_failed(&self, _event: &PaymentNotification) -> StoreResult<()> {
            self.failed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dispatch_by_status() {
        let handler = CountingHandler::default();

        for status in [
            PaymentStatus::Succeeded,
            PaymentStatus::Failed,
            PaymentStatus::Pending,
            PaymentStatus::Succeeded,
        ] {
            let event = PaymentNotification::new("payhere", "order-1", status);
            dispatch_notification(&handler, &event).await.unwrap();
        }

        assert_eq!(handler.succeeded.load(Ordering::SeqCst), 2);
        assert_eq!(handler.failed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_logging_handler_accepts_everything() {
        let event = PaymentNotification::new("payzy", "order-1", PaymentStatus::ChargedBack);
        assert!(dispatch_notification(&LoggingNotificationHandler, &event).await.is_ok());
    }

    #[test]
    fn test_notify_endpoints_only_for_notifying_gateways() {
        let selector = PaymentStrategySelector::default()
            .with_strategy(Arc::new(PayHereStrategy::new(PayHereConfig::new("1", "s"))))
            .with_strategy(Arc::new(PayPalStrategy::new(PayPalConfig::new("id", "secret"))));
        let urls = CheckoutUrls::new("https://atelier.lk", "https://api.atelier.lk");

        let endpoints = notify_endpoints(&selector, &urls);

        assert_eq!(
            endpoints,
            vec![("payhere".to_string(), "https://api.atelier.lk/notify/payhere".to_string())]
        );
    }
}
