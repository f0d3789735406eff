//! Manual bank transfer. No gateway is involved: checkout shows the
//! account details and the order waits until an admin confirms the money
//! arrived.

use crate::config::BankTransferConfig;
use async_trait::async_trait;
use atelier_core::{
    BankInstructions, CheckoutAction, CheckoutSession, CheckoutUrls, Currency, Order,
    PaymentNotification, PaymentStrategy, StoreError, StoreResult,
};
use tracing::info;

const SETTLEMENT_CURRENCIES: &[Currency] = &[Currency::LKR];

pub struct BankTransferStrategy {
    config: BankTransferConfig,
}

impl BankTransferStrategy {
    pub fn new(config: BankTransferConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> StoreResult<Self> {
        Ok(Self::new(BankTransferConfig::from_env()?))
    }

    /// Instructions for an order; the order number is the transfer reference
    pub fn instructions(&self, order: &Order) -> BankInstructions {
        BankInstructions {
            account_name: self.config.account_name.clone(),
            account_number: self.config.account_number.clone(),
            bank_name: self.config.bank_name.clone(),
            branch: self.config.branch.clone(),
            swift: self.config.swift.clone(),
            reference: order.number.clone(),
            amount: order.total().display(),
        }
    }
}

#[async_trait]
impl PaymentStrategy for BankTransferStrategy {
    async fn create_checkout(&self, order: &Order, _urls: &CheckoutUrls) -> StoreResult<CheckoutSession> {
        if order.is_empty() {
            return Err(StoreError::InvalidRequest("Order has no items".to_string()));
        }
        if !self.settles_in(order.currency) {
            return Err(StoreError::UnsupportedCurrency {
                currency: order.currency.to_string(),
            });
        }

        info!("Bank transfer chosen for order {}", order.number);

        Ok(CheckoutSession::new(
            &order.id,
            self.provider_name(),
            CheckoutAction::BankTransfer {
                instructions: self.instructions(order),
            },
        )
        .with_gateway_reference(order.number.clone()))
    }

    async fn verify_notification(
        &self,
        _payload: &[u8],
        _signature: Option<&str>,
    ) -> StoreResult<PaymentNotification> {
        Err(StoreError::InvalidRequest(
            "Bank transfers are confirmed by an administrator".to_string(),
        ))
    }

    fn provider_name(&self) -> &'static str {
        "bank_transfer"
    }

    fn settlement_currencies(&self) -> &'static [Currency] {
        SETTLEMENT_CURRENCIES
    }
}
