//! # Payzy
//!
//! Payzy hosted checkout. The request is a form of `x_`-prefixed fields
//! signed with HMAC-SHA256 over a fixed, ordered field list:
//!
//! ```text
//! signed_field_names = "x_test_mode,x_shopid,...,signed_field_names"
//! signature          = hex(HMAC_SHA256(secret, "x_test_mode=...,x_shopid=...,..."))
//! ```
//!
//! The callback carries its own `signed_field_names`; the signature is
//! recomputed over exactly those fields, in that order.

use crate::config::PayzyConfig;
use crate::signature::{constant_time_eq, hmac_sha256_hex};
use async_trait::async_trait;
use atelier_core::{
    CheckoutAction, CheckoutSession, CheckoutUrls, Currency, Order, PaymentNotification,
    PaymentStatus, PaymentStrategy, Price, StoreError, StoreResult,
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument};

/// Fields signed on the outgoing checkout request, in signing order
pub const CHECKOUT_SIGNED_FIELDS: &[&str] = &[
    "x_test_mode",
    "x_shopid",
    "x_amount",
    "x_order_id",
    "x_response_url",
    "x_first_name",
    "x_last_name",
    "x_company",
    "x_address",
    "x_country",
    "x_state",
    "x_city",
    "x_zip_code",
    "x_freight",
    "x_platform",
    "x_version",
    "signed_field_names",
];

const SETTLEMENT_CURRENCIES: &[Currency] = &[Currency::LKR];

/// Payzy checkout strategy
pub struct PayzyStrategy {
    config: PayzyConfig,
}

impl PayzyStrategy {
    pub fn new(config: PayzyConfig) -> Self {
        Self { config }
    }

    /// Create from environment variables
    pub fn from_env() -> StoreResult<Self> {
        Ok(Self::new(PayzyConfig::from_env()?))
    }

    /// Sign `fields` over `names` in order. Every named field must be present.
    pub fn sign(&self, names: &[&str], fields: &HashMap<String, String>) -> StoreResult<String> {
        let mut parts = Vec::with_capacity(names.len());
        for name in names {
            let value = fields.get(*name).ok_or_else(|| {
                StoreError::NotificationVerificationFailed(format!("signed field {} missing", name))
            })?;
            parts.push(format!("{}={}", name, value));
        }
        Ok(hmac_sha256_hex(&self.config.secret_key, &parts.join(",")))
    }

    fn checkout_fields(&self, order: &Order, urls: &CheckoutUrls) -> StoreResult<HashMap<String, String>> {
        let customer = &order.customer;
        let mut fields: HashMap<String, String> = HashMap::new();
        let mut put = |k: &str, v: String| {
            fields.insert(k.to_string(), v);
        };

        put("x_test_mode", if self.config.test_mode { "on" } else { "off" }.to_string());
        put("x_shopid", self.config.shop_id.clone());
        put("x_amount", order.total().format_amount());
        put("x_order_id", order.id.clone());
        put("x_response_url", urls.notify_url(self));
        put("x_first_name", customer.first_name.clone());
        put("x_last_name", customer.last_name.clone());
        put("x_company", String::new());
        put("x_address", customer.address.clone());
        put("x_country", customer.country.clone());
        put("x_state", String::new());
        put("x_city", customer.city.clone());
        put("x_zip_code", String::new());
        put("x_freight", "0.00".to_string());
        put("x_platform", "custom".to_string());
        put("x_version", "1.0".to_string());
        put("signed_field_names", CHECKOUT_SIGNED_FIELDS.join(","));

        let signature = self.sign(CHECKOUT_SIGNED_FIELDS, &fields)?;
        fields.insert("signature".to_string(), signature);
        Ok(fields)
    }
}

/// Flatten a callback body (JSON object or form) into string fields
fn callback_fields(payload: &[u8]) -> StoreResult<HashMap<String, String>> {
    let trimmed = payload.iter().skip_while(|b| b.is_ascii_whitespace()).next();
    if trimmed == Some(&b'{') {
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(payload)
            .map_err(|e| StoreError::NotificationParseError(format!("Failed to parse Payzy callback: {}", e)))?;
        return Ok(object
            .into_iter()
            .map(|(k, v)| {
                let value = match v {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
                (k, value)
            })
            .collect());
    }

    serde_urlencoded::from_bytes(payload)
        .map_err(|e| StoreError::NotificationParseError(format!("Failed to parse Payzy callback: {}", e)))
}

fn payment_status(fields: &HashMap<String, String>) -> PaymentStatus {
    let raw = fields
        .get("x_status")
        .or_else(|| fields.get("response_code"))
        .map(|s| s.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match raw.as_str() {
        "00" | "success" | "approved" | "completed" => PaymentStatus::Succeeded,
        "pending" => PaymentStatus::Pending,
        "cancelled" | "canceled" => PaymentStatus::Cancelled,
        _ => PaymentStatus::Failed,
    }
}

#[async_trait]
impl PaymentStrategy for PayzyStrategy {
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

        let fields = self.checkout_fields(order, urls)?;
        info!(
            "Created Payzy checkout: order={}, amount={}",
            order.number,
            order.total().display()
        );

        Ok(CheckoutSession::new(
            &order.id,
            self.provider_name(),
            CheckoutAction::FormPost {
                url: self.config.checkout_url.clone(),
                fields: fields.into_iter().collect::<BTreeMap<_, _>>(),
            },
        ))
    }

    #[instrument(skip(self, payload, signature))]
    async fn verify_notification(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> StoreResult<PaymentNotification> {
        let fields = callback_fields(payload)?;

        let provided = fields
            .get("signature")
            .map(String::as_str)
            .or(signature)
            .ok_or_else(|| StoreError::NotificationVerificationFailed("Missing signature".to_string()))?;

        let names: Vec<&str> = fields
            .get("signed_field_names")
            .map(|s| s.split(',').map(str::trim).filter(|n| !n.is_empty()).collect())
            .unwrap_or_default();
        if names.is_empty() {
            return Err(StoreError::NotificationVerificationFailed(
                "No signed_field_names in callback".to_string(),
            ));
        }
        for required in ["x_order_id", "x_amount"] {
            if !names.contains(&required) {
                return Err(StoreError::NotificationVerificationFailed(format!(
                    "{} is not signed",
                    required
                )));
            }
        }

        let expected = self.sign(&names, &fields)?;
        if !constant_time_eq(&provided.to_ascii_lowercase(), &expected) {
            return Err(StoreError::NotificationVerificationFailed(
                "Signature mismatch".to_string(),
            ));
        }

        let order_id = fields
            .get("x_order_id")
            .cloned()
            .ok_or_else(|| StoreError::NotificationParseError("Missing x_order_id".to_string()))?;
        let currency = match fields.get("x_currency") {
            Some(code) if !code.is_empty() => code.parse()?,
            _ => Currency::LKR,
        };
        let amount = fields
            .get("x_amount")
            .map(|a| Price::parse_decimal(a, currency))
            .transpose()?;
        let status = payment_status(&fields);

        debug!("Verified Payzy callback: order={}, status={:?}", order_id, status);

        let mut event = PaymentNotification::new(self.provider_name(), order_id, status);
        event.gateway_reference = fields
            .get("x_transaction_id")
            .or_else(|| fields.get("transaction_id"))
            .cloned();
        event.amount = amount.map(|p| p.amount);
        event.currency = Some(currency);
        event.raw = serde_json::to_value(&fields).ok();
        Ok(event)
    }

    fn provider_name(&self) -> &'static str {
        "payzy"
    }

    fn settlement_currencies(&self) -> &'static [Currency] {
        SETTLEMENT_CURRENCIES
    }
}
