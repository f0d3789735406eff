//! # Braintree
//!
//! Braintree GraphQL API. Checkout returns a client token for the Drop-in
//! UI; the browser tokenizes the card and sends back a payment method
//! nonce, which `complete_payment` charges.

use crate::config::BraintreeConfig;
use async_trait::async_trait;
use atelier_core::{
    CheckoutAction, CheckoutSession, CheckoutUrls, CompletionRequest, Currency, Order,
    PaymentNotification, PaymentStatus, PaymentStrategy, Price, StoreError, StoreResult,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

/// API version pinned in the `Braintree-Version` header
pub const BRAINTREE_VERSION: &str = "2019-01-01";

const SETTLEMENT_CURRENCIES: &[Currency] = &[Currency::USD];

const CLIENT_TOKEN_MUTATION: &str = r#"
mutation ClientToken($input: CreateClientTokenInput) {
  createClientToken(input: $input) {
    clientToken
  }
}"#;

const CHARGE_MUTATION: &str = r#"
mutation Charge($input: ChargePaymentMethodInput!) {
  chargePaymentMethod(input: $input) {
    transaction {
      id
      status
      amount { value currencyCode }
    }
  }
}"#;

/// Braintree strategy
pub struct BraintreeStrategy {
    config: BraintreeConfig,
    client: Client,
}

impl BraintreeStrategy {
    pub fn new(config: BraintreeConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Create from environment variables
    pub fn from_env() -> StoreResult<Self> {
        Ok(Self::new(BraintreeConfig::from_env()?))
    }

    /// Run a GraphQL operation and return its `data`
    async fn graphql<T: DeserializeOwned>(&self, query: &str, variables: Value) -> StoreResult<T> {
        let response = self
            .client
            .post(&self.config.api_url)
            .basic_auth(&self.config.public_key, Some(&self.config.private_key))
            .header("Braintree-Version", BRAINTREE_VERSION)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Braintree API error: status={}, body={}", status, body);
            return Err(StoreError::provider("braintree", format!("HTTP {}: {}", status, body)));
        }

        let envelope: GraphQlResponse<T> = serde_json::from_str(&body).map_err(|e| {
            StoreError::Serialization(format!("Failed to parse Braintree response: {}", e))
        })?;

        if let Some(first) = envelope.errors.first() {
            warn!("Braintree GraphQL errors: {}", envelope.errors.len());
            return Err(StoreError::provider("braintree", first.message.clone()));
        }

        envelope
            .data
            .ok_or_else(|| StoreError::provider("braintree", "response has no data"))
    }
}

fn transaction_status(status: &str) -> PaymentStatus {
    match status {
        "SUBMITTED_FOR_SETTLEMENT" | "SETTLING" | "SETTLED" | "SETTLEMENT_PENDING" => {
            PaymentStatus::Succeeded
        }
        "AUTHORIZED" | "AUTHORIZING" => PaymentStatus::Pending,
        "VOIDED" => PaymentStatus::Cancelled,
        _ => PaymentStatus::Failed,
    }
}

#[async_trait]
impl PaymentStrategy for BraintreeStrategy {
    #[instrument(skip(self, order, _urls), fields(order_id = %order.id))]
    async fn create_checkout(&self, order: &Order, _urls: &CheckoutUrls) -> StoreResult<CheckoutSession> {
        if order.is_empty() {
            return Err(StoreError::InvalidRequest("Order has no items".to_string()));
        }
        if !self.settles_in(order.currency) {
            return Err(StoreError::UnsupportedCurrency {
                currency: order.currency.to_string(),
            });
        }

        let data: ClientTokenData = self
            .graphql(
                CLIENT_TOKEN_MUTATION,
                json!({ "input": { "clientToken": { "merchantAccountId": null } } }),
            )
            .await?;

        info!("Created Braintree client token for order {}", order.number);

        Ok(CheckoutSession::new(
            &order.id,
            self.provider_name(),
            CheckoutAction::ClientToken {
                token: data.create_client_token.client_token,
            },
        ))
    }

    async fn verify_notification(
        &self,
        _payload: &[u8],
        _signature: Option<&str>,
    ) -> StoreResult<PaymentNotification> {
        Err(StoreError::InvalidRequest(
            "Braintree payments are completed by charging a nonce".to_string(),
        ))
    }

    #[instrument(skip(self, order, request), fields(order_id = %order.id))]
    async fn complete_payment(
        &self,
        order: &Order,
        request: &CompletionRequest,
    ) -> StoreResult<PaymentNotification> {
        let nonce = request
            .nonce
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| StoreError::InvalidRequest("payment method nonce is required".to_string()))?;

        let total = order.total();
        let data: ChargeData = self
            .graphql(
                CHARGE_MUTATION,
                json!({
                    "input": {
                        "paymentMethodId": nonce,
                        "transaction": {
                            "amount": total.format_amount(),
                            "orderId": order.number,
                        }
                    }
                }),
            )
            .await?;

        let transaction = data.charge_payment_method.transaction;
        let status = transaction_status(&transaction.status);

        info!(
            "Charged Braintree nonce: transaction={}, status={}, order={}",
            transaction.id, transaction.status, order.number
        );

        let mut event = PaymentNotification::new(self.provider_name(), &order.id, status);
        event.gateway_reference = Some(transaction.id.clone());
        if let Some(amount) = &transaction.amount {
            let currency: Currency = amount.currency_code.parse()?;
            event.amount = Some(Price::parse_decimal(&amount.value, currency)?.amount);
            event.currency = Some(currency);
        }
        event.raw = Some(json!({
            "transaction_id": transaction.id,
            "status": transaction.status,
        }));
        Ok(event)
    }

    fn provider_name(&self) -> &'static str {
        "braintree"
    }

    fn settlement_currencies(&self) -> &'static [Currency] {
        SETTLEMENT_CURRENCIES
    }
}

// =============================================================================
// Braintree API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientTokenData {
    create_client_token: ClientTokenPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientTokenPayload {
    client_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChargeData {
    charge_payment_method: ChargePayload,
}

#[derive(Debug, Deserialize)]
struct ChargePayload {
    transaction: Transaction,
}

#[derive(Debug, Deserialize)]
struct Transaction {
    id: String,
    status: String,
    #[serde(default)]
    amount: Option<TransactionAmount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionAmount {
    value: String,
    currency_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::{CustomerDetails, LineItem};
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn order() -> Order {
        let mut order = Order::new(
            "cust",
            CustomerDetails {
                first_name: "Dilini".into(),
                last_name: "Wickramasinghe".into(),
                email: "dilini@example.com".into(),
                phone: String::new(),
                address: String::new(),
                city: "Toronto".into(),
                country: "CA".into(),
            },
            Currency::USD,
        );
        order.add_item(LineItem {
            product_id: "bangle".into(),
            name: "Gold Bangle".into(),
            variant: Some("M".into()),
            unit_price: Price::new(310.5, Currency::USD),
            quantity: 1,
            image_url: None,
        });
        order
    }

    fn strategy(server: &MockServer) -> BraintreeStrategy {
        BraintreeStrategy::new(
            BraintreeConfig::new("merchant", "public", "private")
                .with_api_url(format!("{}/graphql", server.uri())),
        )
    }

    #[tokio::test]
    async fn test_create_checkout_returns_client_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("Braintree-Version", BRAINTREE_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "createClientToken": { "clientToken": "eyJ2ZXJzaW9uIjoy" } }
            })))
            .mount(&server)
            .await;

        let session = strategy(&server)
            .create_checkout(&order(), &CheckoutUrls::default())
            .await
            .unwrap();

        assert_eq!(
            session.action,
            CheckoutAction::ClientToken {
                token: "eyJ2ZXJzaW9uIjoy".into()
            }
        );
    }

    #[tokio::test]
    async fn test_complete_payment_charges_nonce() {
        let server = MockServer::start().await;
        let order = order();

        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "variables": { "input": {
                    "paymentMethodId": "fake-valid-nonce",
                    "transaction": { "amount": "310.50", "orderId": order.number }
                }}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "chargePaymentMethod": { "transaction": {
                    "id": "dHJhbnNhY3Rpb25fa2ZyZzd2",
                    "status": "SUBMITTED_FOR_SETTLEMENT",
                    "amount": { "value": "310.50", "currencyCode": "USD" }
                }}}
            })))
            .mount(&server)
            .await;

        let request = CompletionRequest {
            nonce: Some("fake-valid-nonce".into()),
            gateway_order_id: None,
        };
        let event = strategy(&server).complete_payment(&order, &request).await.unwrap();

        assert_eq!(event.status, PaymentStatus::Succeeded);
        assert_eq!(event.amount, Some(31_050));
        assert_eq!(event.gateway_reference.as_deref(), Some("dHJhbnNhY3Rpb25fa2ZyZzd2"));
        assert!(event.check_amount(&order).is_ok());
    }

    #[tokio::test]
    async fn test_graphql_errors_become_provider_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{ "message": "Unknown or expired payment_method_nonce." }]
            })))
            .mount(&server)
            .await;

        let request = CompletionRequest {
            nonce: Some("expired".into()),
            gateway_order_id: None,
        };
        let err = strategy(&server)
            .complete_payment(&order(), &request)
            .await
            .unwrap_err();

        match err {
            StoreError::ProviderError { message, .. } => {
                assert!(message.contains("payment_method_nonce"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_payment_requires_nonce() {
        let server = MockServer::start().await;
        let err = strategy(&server)
            .complete_payment(&order(), &CompletionRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRequest(_)));
    }

    #[test]
    fn test_transaction_status_mapping() {
        assert_eq!(transaction_status("SETTLED"), PaymentStatus::Succeeded);
        assert_eq!(transaction_status("AUTHORIZED"), PaymentStatus::Pending);
        assert_eq!(transaction_status("VOIDED"), PaymentStatus::Cancelled);
        assert_eq!(transaction_status("PROCESSOR_DECLINED"), PaymentStatus::Failed);
    }
}
