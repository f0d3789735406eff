//! # Payment Strategy Trait
//!
//! Strategy pattern trait for payment gateways.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PaymentStrategy (trait)                  │
//! │  ├── create_checkout()                                      │
//! │  ├── verify_notification()                                  │
//! │  ├── complete_payment()                                     │
//! │  └── provider_name()                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!     ┌──────────┬───────────┼───────────┬──────────────┐
//!     │          │           │           │              │
//!  PayHere     Payzy      PayPal     Braintree    BankTransfer
//! ```
//!
//! Gateways differ in how the customer is handed over (`CheckoutAction`)
//! and in how the result comes back: PayHere and Payzy call us with a signed
//! notification, PayPal and Braintree are completed by a server-side call
//! after the customer approves in the browser, bank transfers are confirmed
//! by an admin.

use crate::error::{StoreError, StoreResult};
use crate::order::{CheckoutSession, CompletionRequest, Order, PaymentNotification};
use crate::product::Currency;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Core trait for payment gateway implementations.
#[async_trait]
pub trait PaymentStrategy: Send + Sync {
    /// Create a checkout session for an order.
    ///
    /// The order is already priced and in one of `settlement_currencies()`.
    async fn create_checkout(&self, order: &Order, urls: &CheckoutUrls) -> StoreResult<CheckoutSession>;

    /// Verify a gateway callback and parse it.
    ///
    /// # Arguments
    /// * `payload` - Raw request body bytes
    /// * `signature` - Signature header, for gateways that send one
    async fn verify_notification(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> StoreResult<PaymentNotification>;

    /// Finish a payment the customer approved client-side
    /// (PayPal capture, Braintree nonce charge).
    async fn complete_payment(
        &self,
        order: &Order,
        request: &CompletionRequest,
    ) -> StoreResult<PaymentNotification> {
        let _ = (order, request);
        Err(StoreError::InvalidRequest(format!(
            "{} payments are not completed through the API",
            self.provider_name()
        )))
    }

    /// Get the provider name (for logging and routing).
    fn provider_name(&self) -> &'static str;

    /// Currencies the gateway can charge in. Orders in other currencies are
    /// converted before `create_checkout`.
    fn settlement_currencies(&self) -> &'static [Currency] {
        &Currency::ALL
    }

    fn settles_in(&self, currency: Currency) -> bool {
        self.settlement_currencies().contains(&currency)
    }

    /// Get the notification endpoint path for this provider.
    /// Default: `/notify/{provider_name}`
    fn notify_path(&self) -> String {
        format!("/notify/{}", self.provider_name())
    }
}

/// Type alias for a boxed payment strategy (dynamic dispatch)
pub type BoxedPaymentStrategy = Arc<dyn PaymentStrategy>;

/// Strategy selector for multiple providers
#[derive(Clone)]
pub struct PaymentStrategySelector {
    strategies: HashMap<String, BoxedPaymentStrategy>,
    default_provider: String,
}

impl PaymentStrategySelector {
    /// Create a new selector with a default provider
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            strategies: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a payment strategy
    pub fn register(&mut self, strategy: BoxedPaymentStrategy) {
        let name = strategy.provider_name().to_string();
        self.strategies.insert(name, strategy);
    }

    /// Register with builder pattern
    pub fn with_strategy(mut self, strategy: BoxedPaymentStrategy) -> Self {
        self.register(strategy);
        self
    }

    /// Get the default strategy
    pub fn default_strategy(&self) -> Option<&BoxedPaymentStrategy> {
        self.strategies.get(&self.default_provider)
    }

    /// Get a strategy by provider name
    pub fn get(&self, provider: &str) -> Option<&BoxedPaymentStrategy> {
        self.strategies.get(provider)
    }

    /// Get the named strategy, or the default when no name is given.
    ///
    /// An unknown name does not fall back: charging through a gateway the
    /// customer did not pick is worse than failing.
    pub fn get_or_default(&self, provider: Option<&str>) -> Option<&BoxedPaymentStrategy> {
        match provider {
            Some(p) => self.get(p),
            None => self.default_strategy(),
        }
    }

    /// List all registered providers, sorted
    pub fn providers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Check if a provider is registered
    pub fn has_provider(&self, provider: &str) -> bool {
        self.strategies.contains_key(provider)
    }
}

impl Default for PaymentStrategySelector {
    fn default() -> Self {
        Self::new("payhere")
    }
}

/// URLs handed to gateways at checkout
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    /// Storefront base URL (e.g., "https://atelier.lk")
    pub base_url: String,
    /// Public URL of this API, used for gateway callbacks
    pub notify_base_url: String,
    /// Success page path (e.g., "/checkout/success")
    pub success_path: String,
    /// Cancel page path (e.g., "/checkout/cancel")
    pub cancel_path: String,
}

impl CheckoutUrls {
    pub fn new(base_url: impl Into<String>, notify_base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            notify_base_url: notify_base_url.into().trim_end_matches('/').to_string(),
            success_path: "/checkout/success".to_string(),
            cancel_path: "/checkout/cancel".to_string(),
        }
    }

    pub fn success_url(&self, order: &Order) -> String {
        format!("{}{}?order_id={}", self.base_url, self.success_path, order.id)
    }

    pub fn cancel_url(&self, order: &Order) -> String {
        format!("{}{}?order_id={}", self.base_url, self.cancel_path, order.id)
    }

    /// Callback URL for a gateway (e.g. PayHere's `notify_url`)
    pub fn notify_url(&self, strategy: &dyn PaymentStrategy) -> String {
        format!("{}{}", self.notify_base_url, strategy.notify_path())
    }
}

impl Default for CheckoutUrls {
    fn default() -> Self {
        Self::new("http://localhost:3000", "http://localhost:8080")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{CheckoutAction, CustomerDetails, PaymentStatus};

    struct FakeGateway;

    #[async_trait]
    impl PaymentStrategy for FakeGateway {
        async fn create_checkout(&self, order: &Order, urls: &CheckoutUrls) -> StoreResult<CheckoutSession> {
            Ok(CheckoutSession::new(
                &order.id,
                "fake",
                CheckoutAction::Redirect {
                    url: urls.success_url(order),
                },
            ))
        }

        async fn verify_notification(
            &self,
            _payload: &[u8],
            _signature: Option<&str>,
        ) -> StoreResult<PaymentNotification> {
            Ok(PaymentNotification::new("fake", "order", PaymentStatus::Succeeded))
        }

        fn provider_name(&self) -> &'static str {
            "fake"
        }

        fn settlement_currencies(&self) -> &'static [Currency] {
            &[Currency::USD]
        }
    }

    fn order() -> Order {
        Order::new(
            "cust",
            CustomerDetails {
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

    #[test]
    fn test_checkout_urls() {
        let urls = CheckoutUrls::new("https://atelier.lk/", "https://api.atelier.lk");
        let order = order();

        assert_eq!(
            urls.success_url(&order),
            format!("https://atelier.lk/checkout/success?order_id={}", order.id)
        );
        assert_eq!(
            urls.cancel_url(&order),
            format!("https://atelier.lk/checkout/cancel?order_id={}", order.id)
        );
        assert_eq!(urls.notify_url(&FakeGateway), "https://api.atelier.lk/notify/fake");
    }

    #[test]
    fn test_strategy_selector() {
        let selector = PaymentStrategySelector::new("fake");
        assert!(selector.providers().is_empty());
        assert!(selector.default_strategy().is_none());

        let selector = selector.with_strategy(Arc::new(FakeGateway));
        assert!(selector.has_provider("fake"));
        assert!(selector.get_or_default(None).is_some());
        assert!(selector.get_or_default(Some("paypal")).is_none());
    }

    #[test]
    fn test_settlement_currencies() {
        assert!(FakeGateway.settles_in(Currency::USD));
        assert!(!FakeGateway.settles_in(Currency::LKR));
    }

    #[tokio::test]
    async fn test_complete_payment_unsupported_by_default() {
        let err = FakeGateway
            .complete_payment(&order(), &CompletionRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRequest(_)));
    }
}
