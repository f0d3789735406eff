//! # PayPal
//!
//! PayPal Orders v2. Checkout creates a PayPal order and redirects the
//! customer to its approval link; once approved, the storefront calls
//! `complete_payment` which captures the order server-side.

use crate::config::PayPalConfig;
use async_trait::async_trait;
use atelier_core::{
    CheckoutAction, CheckoutSession, CheckoutUrls, CompletionRequest, Currency, Order,
    PaymentNotification, PaymentStatus, PaymentStrategy, Price, StoreError, StoreResult,
};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

const SETTLEMENT_CURRENCIES: &[Currency] = &[
    Currency::USD,
    Currency::EUR,
    Currency::GBP,
    Currency::AUD,
    Currency::CAD,
    Currency::SGD,
    Currency::JPY,
];

const BRAND_NAME: &str = "Atelier";

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// PayPal Orders v2 strategy
pub struct PayPalStrategy {
    config: PayPalConfig,
    client: Client,
    token: Mutex<Option<CachedToken>>,
}

impl PayPalStrategy {
    pub fn new(config: PayPalConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            client,
            token: Mutex::new(None),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> StoreResult<Self> {
        Ok(Self::new(PayPalConfig::from_env()?))
    }

    /// OAuth access token, fetched once and reused until shortly before expiry
    async fn access_token(&self) -> StoreResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.access_token.clone());
            }
        }

        let url = format!("{}/v1/oauth2/token", self.config.api_base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        let token: TokenResponse = read_json(response).await?;
        debug!("Fetched PayPal access token, expires in {}s", token.expires_in);

        // Refresh a minute early
        let lifetime = (token.expires_in - 60).max(0);
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Utc::now() + Duration::seconds(lifetime),
        });
        Ok(token.access_token)
    }

    fn order_request(&self, order: &Order, urls: &CheckoutUrls) -> CreateOrderRequest {
        let total = order.total();
        CreateOrderRequest {
            intent: "CAPTURE",
            purchase_units: vec![PurchaseUnit {
                reference_id: order.id.clone(),
                invoice_id: order.number.clone(),
                description: order.item_summary(),
                amount: Amount {
                    currency_code: total.currency.code().to_string(),
                    value: total.format_amount(),
                },
            }],
            application_context: ApplicationContext {
                brand_name: BRAND_NAME,
                return_url: urls.success_url(order),
                cancel_url: urls.cancel_url(order),
                user_action: "PAY_NOW",
                shipping_preference: "NO_SHIPPING",
            },
        }
    }
}

/// Turn a PayPal response into `T`, mapping error bodies to `ProviderError`
async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> StoreResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| StoreError::NetworkError(e.to_string()))?;

    if !status.is_success() {
        error!("PayPal API error: status={}, body={}", status, body);

        if let Ok(err) = serde_json::from_str::<PayPalErrorResponse>(&body) {
            let message = err
                .message
                .or(err.error_description)
                .unwrap_or_else(|| format!("HTTP {}", status));
            let name = err.name.or(err.error).unwrap_or_default();
            return Err(StoreError::provider("paypal", format!("{}: {}", name, message)));
        }

        return Err(StoreError::provider("paypal", format!("HTTP {}: {}", status, body)));
    }

    serde_json::from_str(&body)
        .map_err(|e| StoreError::Serialization(format!("Failed to parse PayPal response: {}", e)))
}

fn capture_status(status: &str) -> PaymentStatus {
    match status {
        "COMPLETED" => PaymentStatus::Succeeded,
        "PENDING" => PaymentStatus::Pending,
        _ => PaymentStatus::Failed,
    }
}

#[async_trait]
impl PaymentStrategy for PayPalStrategy {
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

        let token = self.access_token().await?;
        let url = format!("{}/v2/checkout/orders", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .header("PayPal-Request-Id", &order.id)
            .json(&self.order_request(order, urls))
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        let created: PayPalOrder = read_json(response).await?;

        let approve_url = created
            .links
            .iter()
            .find(|l| l.rel == "approve" || l.rel == "payer-action")
            .map(|l| l.href.clone())
            .ok_or_else(|| {
                StoreError::CheckoutCreationFailed(format!("PayPal order {} has no approval link", created.id))
            })?;

        info!(
            "Created PayPal order: id={}, order={}, amount={}",
            created.id,
            order.number,
            order.total().display()
        );

        Ok(CheckoutSession::new(
            &order.id,
            self.provider_name(),
            CheckoutAction::Redirect { url: approve_url },
        )
        .with_gateway_reference(created.id))
    }

    async fn verify_notification(
        &self,
        _payload: &[u8],
        _signature: Option<&str>,
    ) -> StoreResult<PaymentNotification> {
        Err(StoreError::InvalidRequest(
            "PayPal payments are completed by capture, not by notification".to_string(),
        ))
    }

    #[instrument(skip(self, order, request), fields(order_id = %order.id))]
    async fn complete_payment(
        &self,
        order: &Order,
        request: &CompletionRequest,
    ) -> StoreResult<PaymentNotification> {
        let paypal_id = match (&request.gateway_order_id, &order.gateway_reference) {
            (Some(given), Some(stored)) if given != stored => {
                return Err(StoreError::InvalidRequest(format!(
                    "PayPal order {} does not belong to order {}",
                    given, order.number
                )));
            }
            (Some(id), _) | (None, Some(id)) => id.clone(),
            (None, None) => {
                return Err(StoreError::InvalidRequest(
                    "No PayPal order id for this order".to_string(),
                ));
            }
        };

        let token = self.access_token().await?;
        let url = format!(
            "{}/v2/checkout/orders/{}/capture",
            self.config.api_base_url, paypal_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .header("PayPal-Request-Id", format!("{}-capture", order.id))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        let captured: PayPalOrder = read_json(response).await?;
        let status = capture_status(&captured.status);

        let capture = captured
            .purchase_units
            .iter()
            .flat_map(|u| u.payments.iter().flat_map(|p| p.captures.iter()))
            .next();

        info!(
            "Captured PayPal order: id={}, status={}, order={}",
            captured.id, captured.status, order.number
        );

        let mut event = PaymentNotification::new(self.provider_name(), &order.id, status);
        event.gateway_reference = Some(
            capture
                .map(|c| c.id.clone())
                .unwrap_or_else(|| captured.id.clone()),
        );
        if let Some(capture) = capture {
            let currency: Currency = capture.amount.currency_code.parse()?;
            event.amount = Some(Price::parse_decimal(&capture.amount.value, currency)?.amount);
            event.currency = Some(currency);
        }
        event.raw = serde_json::to_value(&captured).ok();
        Ok(event)
    }

    fn provider_name(&self) -> &'static str {
        "paypal"
    }

    fn settlement_currencies(&self) -> &'static [Currency] {
        SETTLEMENT_CURRENCIES
    }
}

// =============================================================================
// PayPal API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: i64,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest {
    intent: &'static str,
    purchase_units: Vec<PurchaseUnit>,
    application_context: ApplicationContext,
}

#[derive(Debug, Serialize)]
struct PurchaseUnit {
    reference_id: String,
    invoice_id: String,
    description: String,
    amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Amount {
    currency_code: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct ApplicationContext {
    brand_name: &'static str,
    return_url: String,
    cancel_url: String,
    user_action: &'static str,
    shipping_preference: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
struct PayPalOrder {
    id: String,
    status: String,
    #[serde(default)]
    links: Vec<Link>,
    #[serde(default)]
    purchase_units: Vec<CapturedUnit>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Link {
    href: String,
    rel: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CapturedUnit {
    #[serde(default)]
    payments: Option<Payments>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Payments {
    #[serde(default)]
    captures: Vec<Capture>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Capture {
    id: String,
    status: String,
    amount: Amount,
}

#[derive(Debug, Deserialize)]
struct PayPalErrorResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
    // OAuth endpoint uses a different shape
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::{CustomerDetails, LineItem};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn order() -> Order {
        let mut order = Order::new(
            "cust",
            CustomerDetails {
                first_name: "Amara".into(),
                last_name: "Jayasuriya".into(),
                email: "amara@example.com".into(),
                phone: String::new(),
                address: String::new(),
                city: "London".into(),
                country: "GB".into(),
            },
            Currency::USD,
        );
        order.add_item(LineItem {
            product_id: "studs".into(),
            name: "Diamond Studs".into(),
            variant: None,
            unit_price: Price::new(120.0, Currency::USD),
            quantity: 1,
            image_url: None,
        });
        order
    }

    async fn mock_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/v1/oauth2/token"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "A21AA-token",
                "token_type": "Bearer",
                "expires_in": 32400
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    fn strategy(server: &MockServer) -> PayPalStrategy {
        PayPalStrategy::new(PayPalConfig::new("client", "secret").with_api_base_url(server.uri()))
    }

    #[tokio::test]
    async fn test_create_checkout_redirects_to_approval() {
        let server = MockServer::start().await;
        mock_token(&server).await;
        let order = order();

        Mock::given(method("POST"))
            .and(path("/v2/checkout/orders"))
            .and(header("authorization", "Bearer A21AA-token"))
            .and(header("PayPal-Request-Id", order.id.as_str()))
            .and(body_partial_json(json!({
                "intent": "CAPTURE",
                "purchase_units": [{
                    "reference_id": order.id,
                    "amount": { "currency_code": "USD", "value": "120.00" }
                }]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "5O190127TN364715T",
                "status": "CREATED",
                "links": [
                    { "href": "https://api.sandbox.paypal.com/v2/checkout/orders/5O190127TN364715T", "rel": "self" },
                    { "href": "https://www.sandbox.paypal.com/checkoutnow?token=5O190127TN364715T", "rel": "approve" }
                ]
            })))
            .mount(&server)
            .await;

        let session = strategy(&server)
            .create_checkout(&order, &CheckoutUrls::default())
            .await
            .unwrap();

        assert_eq!(session.gateway_reference.as_deref(), Some("5O190127TN364715T"));
        assert_eq!(
            session.action,
            CheckoutAction::Redirect {
                url: "https://www.sandbox.paypal.com/checkoutnow?token=5O190127TN364715T".into()
            }
        );
    }

    #[tokio::test]
    async fn test_token_is_reused() {
        let server = MockServer::start().await;
        mock_token(&server).await;
        let s = strategy(&server);

        let first = s.access_token().await.unwrap();
        let second = s.access_token().await.unwrap();
        assert_eq!(first, second);
        // expect(1) on the token mock is checked when the server drops
    }

    #[tokio::test]
    async fn test_create_checkout_provider_error() {
        let server = MockServer::start().await;
        mock_token(&server).await;

        Mock::given(method("POST"))
            .and(path("/v2/checkout/orders"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "name": "UNPROCESSABLE_ENTITY",
                "message": "The requested action could not be performed."
            })))
            .mount(&server)
            .await;

        let err = strategy(&server)
            .create_checkout(&order(), &CheckoutUrls::default())
            .await
            .unwrap_err();

        match err {
            StoreError::ProviderError { provider, message } => {
                assert_eq!(provider, "paypal");
                assert!(message.contains("UNPROCESSABLE_ENTITY"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_payment_captures() {
        let server = MockServer::start().await;
        mock_token(&server).await;

        Mock::given(method("POST"))
            .and(path("/v2/checkout/orders/5O190127TN364715T/capture"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "5O190127TN364715T",
                "status": "COMPLETED",
                "purchase_units": [{
                    "payments": { "captures": [{
                        "id": "3C679366HH908993F",
                        "status": "COMPLETED",
                        "amount": { "currency_code": "USD", "value": "120.00" }
                    }]}
                }]
            })))
            .mount(&server)
            .await;

        let mut order = order();
        order.gateway_reference = Some("5O190127TN364715T".into());

        let event = strategy(&server)
            .complete_payment(&order, &CompletionRequest::default())
            .await
            .unwrap();

        assert_eq!(event.status, PaymentStatus::Succeeded);
        assert_eq!(event.amount, Some(12_000));
        assert_eq!(event.currency, Some(Currency::USD));
        assert_eq!(event.gateway_reference.as_deref(), Some("3C679366HH908993F"));
        assert!(event.check_amount(&order).is_ok());
    }

    #[tokio::test]
    async fn test_complete_payment_rejects_foreign_paypal_order() {
        let server = MockServer::start().await;
        let mut order = order();
        order.gateway_reference = Some("MINE".into());

        let request = CompletionRequest {
            nonce: None,
            gateway_order_id: Some("SOMEONE-ELSES".into()),
        };
        let err = strategy(&server)
            .complete_payment(&order, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_verify_notification_not_supported() {
        let server = MockServer::start().await;
        let err = strategy(&server)
            .verify_notification(b"{}", None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRequest(_)));
    }

    #[test]
    fn test_capture_status_mapping() {
        assert_eq!(capture_status("COMPLETED"), PaymentStatus::Succeeded);
        assert_eq!(capture_status("PENDING"), PaymentStatus::Pending);
        assert_eq!(capture_status("DECLINED"), PaymentStatus::Failed);
    }
}
