//! # Order Types
//!
//! Orders, checkout sessions and payment notifications.

use crate::cart::{PricedCart, PricedLine};
use crate::currency::RateTable;
use crate::error::{StoreError, StoreResult};
use crate::product::{Currency, Price};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Billing/shipping details collected at checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    pub country: String,
}

impl CustomerDetails {
    pub fn validate(&self) -> StoreResult<()> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(StoreError::InvalidRequest("first and last name are required".to_string()));
        }
        if !is_valid_email(&self.email) {
            return Err(StoreError::InvalidRequest(format!("invalid email: {}", self.email)));
        }
        if self.country.trim().is_empty() {
            return Err(StoreError::InvalidRequest("country is required".to_string()));
        }
        Ok(())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// Basic email validation: something before '@', a dotted domain after it.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

/// A line item in an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,

    /// Product name (denormalized for emails and gateway item lists)
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,

    pub unit_price: Price,

    pub quantity: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl LineItem {
    pub fn from_priced(line: &PricedLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            variant: line.variant.clone(),
            unit_price: line.unit_price.clone(),
            quantity: line.quantity,
            image_url: line.image_url.clone(),
        }
    }

    /// Calculate the total price for this line item
    pub fn total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, waiting for the gateway
    Pending,
    /// Bank transfer chosen; waiting for the money to arrive
    AwaitingTransfer,
    Paid,
    Failed,
    Cancelled,
    Refunded,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::AwaitingTransfer => "awaiting_transfer",
            OrderStatus::Paid => "paid",
            OrderStatus::Failed => "failed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid | Failed | Cancelled | AwaitingTransfer)
                | (AwaitingTransfer, Paid | Cancelled)
                | (Failed, Pending)
                | (Paid, Refunded)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order to be checked out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID (generated)
    pub id: String,

    /// Human-readable reference shown to customers and used for bank transfers
    pub number: String,

    pub customer_id: String,

    pub customer: CustomerDetails,

    pub line_items: Vec<LineItem>,

    /// Currency (same for all items)
    pub currency: Currency,

    #[serde(default)]
    pub status: OrderStatus,

    /// Payment provider chosen at checkout
    #[serde(default)]
    pub provider: String,

    /// Gateway-side id (PayPal order id, PayHere payment id, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_reference: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Order {
    /// Create a new empty order with generated ID and number
    pub fn new(customer_id: impl Into<String>, customer: CustomerDetails, currency: Currency) -> Self {
        let id = Uuid::new_v4();
        let now = Utc::now();
        Self {
            number: format!("ATL-{}", &id.simple().to_string()[..8].to_uppercase()),
            id: id.to_string(),
            customer_id: customer_id.into(),
            customer,
            line_items: Vec::new(),
            currency,
            status: OrderStatus::Pending,
            provider: String::new(),
            gateway_reference: None,
            created_at: now,
            updated_at: now,
            metadata: HashMap::new(),
        }
    }

    /// Create an order from a server-priced cart
    pub fn from_priced_cart(
        customer_id: impl Into<String>,
        customer: CustomerDetails,
        cart: &PricedCart,
    ) -> Self {
        let mut order = Self::new(customer_id, customer, cart.subtotal.currency);
        order.line_items = cart.lines.iter().map(LineItem::from_priced).collect();
        order
    }

    /// Add a line item
    pub fn add_item(&mut self, item: LineItem) {
        self.line_items.push(item);
    }

    /// Calculate order total
    pub fn total(&self) -> Price {
        let total_amount = self
            .line_items
            .iter()
            .fold(0_i64, |sum, item| sum.saturating_add(item.total().amount));
        Price::from_minor(total_amount, self.currency)
    }

    /// What `total()` would be after `convert(rates, to)`.
    ///
    /// Lines are converted one unit price at a time, as the catalog shows
    /// them, so this is the amount a gateway settling in `to` charges.
    pub fn total_in(&self, rates: &RateTable, to: Currency) -> StoreResult<Price> {
        let mut converted = self.clone();
        converted.convert(rates, to)?;
        Ok(converted.total())
    }

    /// Check if order is empty
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    /// Get item count
    pub fn item_count(&self) -> u32 {
        self.line_items.iter().map(|i| i.quantity).sum()
    }

    pub fn contains_product(&self, product_id: &str) -> bool {
        self.line_items.iter().any(|i| i.product_id == product_id)
    }

    /// Comma-separated item names (gateway "items" field)
    pub fn item_summary(&self) -> String {
        self.line_items
            .iter()
            .map(|i| {
                if i.quantity > 1 {
                    format!("{} x{}", i.name, i.quantity)
                } else {
                    i.name.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Re-price every line in another currency.
    ///
    /// The original total is kept in metadata for reconciliation.
    pub fn convert(&mut self, rates: &RateTable, to: Currency) -> StoreResult<()> {
        if self.currency == to {
            return Ok(());
        }
        let original = self.total();
        for item in &mut self.line_items {
            item.unit_price = rates.convert(&item.unit_price, to)?;
        }
        self.currency = to;
        self.metadata
            .insert("original_total".to_string(), original.format_amount());
        self.metadata
            .insert("original_currency".to_string(), original.currency.to_string());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Move to a new status.
    ///
    /// Returns `Ok(false)` when the order already has that status, so repeated
    /// gateway notifications are harmless.
    pub fn set_status(&mut self, next: OrderStatus) -> StoreResult<bool> {
        if self.status == next {
            return Ok(false);
        }
        if !self.status.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(true)
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Bank details shown for manual transfers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankInstructions {
    pub account_name: String,
    pub account_number: String,
    pub bank_name: String,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swift: Option<String>,
    /// Reference the customer must quote (order number)
    pub reference: String,
    /// Amount to transfer, formatted for display
    pub amount: String,
}

/// What the frontend must do to hand the customer to the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckoutAction {
    /// Send the browser to a hosted approval page
    Redirect { url: String },
    /// Auto-submit a signed HTML form to the gateway
    FormPost {
        url: String,
        fields: BTreeMap<String, String>,
    },
    /// Initialise a client-side drop-in with this token
    ClientToken { token: String },
    /// Show manual transfer instructions
    BankTransfer { instructions: BankInstructions },
}

/// A checkout session created by a payment provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub order_id: String,

    /// Provider name (e.g., "payhere", "paypal")
    pub provider: String,

    pub action: CheckoutAction,

    /// Gateway-side id, when the gateway creates one up front
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_reference: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl CheckoutSession {
    pub fn new(order_id: impl Into<String>, provider: impl Into<String>, action: CheckoutAction) -> Self {
        Self {
            order_id: order_id.into(),
            provider: provider.into(),
            action,
            gateway_reference: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_gateway_reference(mut self, reference: impl Into<String>) -> Self {
        self.gateway_reference = Some(reference.into());
        self
    }
}

/// Payment outcome reported by a gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Succeeded,
    Pending,
    Failed,
    Cancelled,
    ChargedBack,
}

impl PaymentStatus {
    /// Order status this outcome leads to, if any
    pub fn order_status(&self) -> Option<OrderStatus> {
        match self {
            PaymentStatus::Succeeded => Some(OrderStatus::Paid),
            PaymentStatus::Pending => None,
            PaymentStatus::Failed => Some(OrderStatus::Failed),
            PaymentStatus::Cancelled => Some(OrderStatus::Cancelled),
            PaymentStatus::ChargedBack => Some(OrderStatus::Refunded),
        }
    }
}

/// A verified notification from a payment gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub provider: String,

    /// Our order id
    pub order_id: String,

    /// Gateway's payment / transaction id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_reference: Option<String>,

    pub status: PaymentStatus,

    /// Amount paid (in smallest unit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,

    /// Raw payload (for debugging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,

    pub received_at: DateTime<Utc>,
}

impl PaymentNotification {
    pub fn new(provider: impl Into<String>, order_id: impl Into<String>, status: PaymentStatus) -> Self {
        Self {
            provider: provider.into(),
            order_id: order_id.into(),
            gateway_reference: None,
            status,
            amount: None,
            currency: None,
            raw: None,
            received_at: Utc::now(),
        }
    }

    /// Check the reported amount against the order total.
    ///
    /// Notifications without an amount are accepted.
    pub fn check_amount(&self, order: &Order) -> StoreResult<()> {
        let Some(amount) = self.amount else {
            return Ok(());
        };
        let total = order.total();
        let currency = self.currency.unwrap_or(total.currency);
        if amount != total.amount || currency != total.currency {
            return Err(StoreError::InvalidPrice {
                message: format!(
                    "gateway reported {} but order {} totals {}",
                    Price::from_minor(amount, currency).display(),
                    order.number,
                    total.display()
                ),
            });
        }
        Ok(())
    }
}

/// Data the client returns after approving a payment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Braintree payment method nonce
    #[serde(default)]
    pub nonce: Option<String>,
    /// PayPal order id (also stored on the order at checkout)
    #[serde(default)]
    pub gateway_order_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> CustomerDetails {
        CustomerDetails {
            first_name: "Nadeesha".into(),
            last_name: "Perera".into(),
            email: "nadeesha@example.lk".into(),
            phone: "0771234567".into(),
            address: "12 Galle Road".into(),
            city: "Colombo".into(),
            country: "Sri Lanka".into(),
        }
    }

    fn line(id: &str, amount: f64, quantity: u32) -> LineItem {
        LineItem {
            product_id: id.into(),
            name: id.to_uppercase(),
            variant: None,
            unit_price: Price::new(amount, Currency::LKR),
            quantity,
            image_url: None,
        }
    }

    #[test]
    fn test_order_total() {
        let mut order = Order::new("cust", customer(), Currency::LKR);
        order.add_item(line("ring", 10_000.0, 2));
        order.add_item(line("chain", 25_000.0, 1));

        assert_eq!(order.total(), Price::new(45_000.0, Currency::LKR));
        assert_eq!(order.item_count(), 3);
        assert_eq!(order.item_summary(), "RING x2, CHAIN");
        assert!(order.number.starts_with("ATL-"));
        assert_eq!(order.number.len(), 12);
    }

    #[test]
    fn test_status_transitions() {
        let mut order = Order::new("cust", customer(), Currency::LKR);

        assert!(order.set_status(OrderStatus::AwaitingTransfer).unwrap());
        assert!(!order.set_status(OrderStatus::AwaitingTransfer).unwrap());
        assert!(order.set_status(OrderStatus::Failed).is_err());
        assert!(order.set_status(OrderStatus::Paid).unwrap());
        assert!(order.set_status(OrderStatus::Pending).is_err());
        assert!(order.set_status(OrderStatus::Refunded).unwrap());
    }

    #[test]
    fn test_failed_order_can_retry() {
        let mut order = Order::new("cust", customer(), Currency::LKR);
        order.set_status(OrderStatus::Failed).unwrap();
        assert!(order.set_status(OrderStatus::Pending).unwrap());
    }

    #[test]
    fn test_convert_keeps_original_total() {
        let rates = RateTable::new(Currency::LKR).with_rate(Currency::USD, 0.004);
        let mut order = Order::new("cust", customer(), Currency::LKR);
        order.add_item(line("ring", 10_000.0, 2));

        order.convert(&rates, Currency::USD).unwrap();

        assert_eq!(order.currency, Currency::USD);
        assert_eq!(order.total(), Price::new(80.0, Currency::USD));
        assert_eq!(order.metadata.get("original_total").unwrap(), "20000.00");
        assert_eq!(order.metadata.get("original_currency").unwrap(), "LKR");
    }

    #[test]
    fn test_total_in_matches_converted_order() {
        let rates = RateTable::default();
        let mut order = Order::new("cust", customer(), Currency::LKR);
        order.add_item(line("charm", 1234.57, 3));

        // Rs 1234.57 is $4.07 a unit; the whole subtotal would round to $12.22
        let shown = order.total_in(&rates, Currency::USD).unwrap();
        assert_eq!(shown, Price::from_minor(1221, Currency::USD));
        assert_eq!(order.currency, Currency::LKR);

        order.convert(&rates, Currency::USD).unwrap();
        assert_eq!(order.total(), shown);
    }

    #[test]
    fn test_customer_validation() {
        assert!(customer().validate().is_ok());

        let mut bad = customer();
        bad.email = "not-an-email".into();
        assert!(bad.validate().is_err());

        let mut bad = customer();
        bad.last_name = "  ".into();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@b.lk"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.lk"));
        assert!(!is_valid_email("a b@c.lk"));
        assert!(!is_valid_email("a@.lk"));
    }

    #[test]
    fn test_notification_amount_check() {
        let mut order = Order::new("cust", customer(), Currency::LKR);
        order.add_item(line("ring", 10_000.0, 1));

        let mut ok = PaymentNotification::new("payhere", &order.id, PaymentStatus::Succeeded);
        ok.amount = Some(1_000_000);
        ok.currency = Some(Currency::LKR);
        assert!(ok.check_amount(&order).is_ok());

        let mut short = ok.clone();
        short.amount = Some(100);
        assert!(short.check_amount(&order).is_err());

        let mut wrong_currency = ok.clone();
        wrong_currency.currency = Some(Currency::USD);
        assert!(wrong_currency.check_amount(&order).is_err());
    }

    #[test]
    fn test_checkout_action_serialization() {
        let action = CheckoutAction::Redirect {
            url: "https://www.sandbox.paypal.com/checkoutnow?token=1".into(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "redirect");
        assert_eq!(json["url"], "https://www.sandbox.paypal.com/checkoutnow?token=1");
    }
}
