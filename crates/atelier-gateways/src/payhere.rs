//! # PayHere
//!
//! PayHere hosted checkout. The browser posts a signed form to PayHere;
//! PayHere reports the outcome to our `notify_url` with a form-encoded POST.
//!
//! ```text
//! hash   = UPPER(MD5(merchant_id + order_id + amount + currency + UPPER(MD5(secret))))
//! md5sig = UPPER(MD5(merchant_id + order_id + payhere_amount + payhere_currency
//!                    + status_code + UPPER(MD5(secret))))
//! ```

use crate::config::PayHereConfig;
use crate::signature::{constant_time_eq, md5_upper_hex};
use async_trait::async_trait;
use atelier_core::{
    CheckoutAction, CheckoutSession, CheckoutUrls, Currency, Order, PaymentNotification,
    PaymentStatus, PaymentStrategy, Price, StoreError, StoreResult,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

const SETTLEMENT_CURRENCIES: &[Currency] = &[Currency::LKR, Currency::USD];

/// PayHere checkout strategy
pub struct PayHereStrategy {
    config: PayHereConfig,
    secret_hash: String,
}

impl PayHereStrategy {
    pub fn new(config: PayHereConfig) -> Self {
        let secret_hash = md5_upper_hex(&config.merchant_secret);
        Self {
            config,
            secret_hash,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> StoreResult<Self> {
        Ok(Self::new(PayHereConfig::from_env()?))
    }

    /// Hash sent with the checkout form
    pub fn checkout_hash(&self, order_id: &str, amount: &str, currency: &str) -> String {
        md5_upper_hex(&format!(
            "{}{}{}{}{}",
            self.config.merchant_id, order_id, amount, currency, self.secret_hash
        ))
    }

    /// Signature PayHere puts in `md5sig`
    pub fn notification_signature(
        &self,
        order_id: &str,
        amount: &str,
        currency: &str,
        status_code: &str,
    ) -> String {
        md5_upper_hex(&format!(
            "{}{}{}{}{}{}",
            self.config.merchant_id, order_id, amount, currency, status_code, self.secret_hash
        ))
    }

    fn checkout_fields(&self, order: &Order, urls: &CheckoutUrls) -> BTreeMap<String, String> {
        let total = order.total();
        let amount = total.format_amount();
        let currency = total.currency.code();
        let customer = &order.customer;

        let mut fields = BTreeMap::new();
        let mut put = |k: &str, v: String| {
            fields.insert(k.to_string(), v);
        };
        put("merchant_id", self.config.merchant_id.clone());
        put("return_url", urls.success_url(order));
        put("cancel_url", urls.cancel_url(order));
        put("notify_url", urls.notify_url(self));
        put("order_id", order.id.clone());
        put("items", order.item_summary());
        put("currency", currency.to_string());
        put("amount", amount.clone());
        put("first_name", customer.first_name.clone());
        put("last_name", customer.last_name.clone());
        put("email", customer.email.clone());
        put("phone", customer.phone.clone());
        put("address", customer.address.clone());
        put("city", customer.city.clone());
        put("country", customer.country.clone());
        put("custom_1", order.number.clone());
        put("hash", self.checkout_hash(&order.id, &amount, currency));
        fields
    }
}

/// Form fields PayHere posts to `notify_url`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayHereNotification {
    pub merchant_id: String,
    pub order_id: String,
    #[serde(default)]
    pub payment_id: Option<String>,
    pub payhere_amount: String,
    pub payhere_currency: String,
    pub status_code: String,
    pub md5sig: String,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

/// Map PayHere's numeric status code
fn payment_status(code: &str) -> StoreResult<PaymentStatus> {
    match code.trim() {
        "2" => Ok(PaymentStatus::Succeeded),
        "0" => Ok(PaymentStatus::Pending),
        "-1" => Ok(PaymentStatus::Cancelled),
        "-2" => Ok(PaymentStatus::Failed),
        "-3" => Ok(PaymentStatus::ChargedBack),
        other => Err(StoreError::NotificationParseError(format!(
            "unknown PayHere status_code {}",
            other
        ))),
    }
}

#[async_trait]
impl PaymentStrategy for PayHereStrategy {
    #[instrument(skip(self, order, urls), fields(order_id = %order.id))]
    async fn create_checkout(&self, order: &Order, urls: &CheckoutUrls) -> StoreResult<CheckoutSession> {
        if order.is_empty() {
            return Err(StoreError::InvalidRequest("Order has no items".to_string()));
        }
        if !self.settles_in(order.currency) {
            return Err(StoreError::UnsupportedCurrency {
                currency: order.currency.to_string(),
            });
        }

        let fields = self.checkout_fields(order, urls);
        debug!("Built PayHere checkout form: {} fields", fields.len());
        info!(
            "Created PayHere checkout: order={}, amount={}",
            order.number,
            order.total().display()
        );

        Ok(CheckoutSession::new(
            &order.id,
            self.provider_name(),
            CheckoutAction::FormPost {
                url: self.config.checkout_url.clone(),
                fields,
            },
        ))
    }

    #[instrument(skip(self, payload, _signature))]
    async fn verify_notification(
        &self,
        payload: &[u8],
        _signature: Option<&str>,
    ) -> StoreResult<PaymentNotification> {
        let notification: PayHereNotification = serde_urlencoded::from_bytes(payload).map_err(|e| {
            StoreError::NotificationParseError(format!("Failed to parse PayHere notification: {}", e))
        })?;

        if notification.merchant_id != self.config.merchant_id {
            warn!("PayHere notification for merchant {}", notification.merchant_id);
            return Err(StoreError::NotificationVerificationFailed(
                "Merchant id mismatch".to_string(),
            ));
        }

        let expected = self.notification_signature(
            &notification.order_id,
            &notification.payhere_amount,
            &notification.payhere_currency,
            &notification.status_code,
        );
        if !constant_time_eq(&notification.md5sig.to_ascii_uppercase(), &expected) {
            return Err(StoreError::NotificationVerificationFailed(
                "Signature mismatch".to_string(),
            ));
        }

        let status = payment_status(&notification.status_code)?;
        let currency: Currency = notification.payhere_currency.parse()?;
        let amount = Price::parse_decimal(&notification.payhere_amount, currency)?;

        debug!(
            "Verified PayHere notification: order={}, status={:?}",
            notification.order_id, status
        );

        let mut event = PaymentNotification::new(self.provider_name(), &notification.order_id, status);
        event.gateway_reference = notification.payment_id.clone();
        event.amount = Some(amount.amount);
        event.currency = Some(currency);
        event.raw = serde_json::to_value(&notification).ok();
        Ok(event)
    }

    fn provider_name(&self) -> &'static str {
        "payhere"
    }

    fn settlement_currencies(&self) -> &'static [Currency] {
        SETTLEMENT_CURRENCIES
    }
}
