//! # Email
//!
//! Transactional email through Resend. Without `RESEND_API_KEY` the
//! `LogMailer` is used and messages only go to the log.
//!
//! Sending never fails a request: callers use `send_logged`.

use async_trait::async_trait;
use atelier_core::{BankInstructions, Order, StoreError, StoreResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// An outgoing message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> StoreResult<()>;
}

pub type SharedMailer = Arc<dyn Mailer>;

/// Send and log the outcome; delivery problems are not the customer's
pub async fn send_logged(mailer: &dyn Mailer, email: Email) {
    match mailer.send(&email).await {
        Ok(()) => info!("Sent email \"{}\" to {}", email.subject, email.to),
        Err(e) => warn!("Failed to send \"{}\" to {}: {}", email.subject, email.to, e),
    }
}

/// Resend API mailer
pub struct ResendMailer {
    api_key: String,
    from: String,
    api_url: String,
    client: Client,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key: api_key.into(),
            from: from.into(),
            api_url: RESEND_API_URL.to_string(),
            client,
        }
    }

    /// `RESEND_API_KEY` plus `EMAIL_FROM` (default `Atelier <orders@atelier.lk>`)
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("RESEND_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
        let from = std::env::var("EMAIL_FROM").unwrap_or_else(|_| "Atelier <orders@atelier.lk>".to_string());
        Some(Self::new(api_key, from))
    }

    /// Builder: set custom API URL (for testing)
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct ResendResponse {
    id: String,
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &Email) -> StoreResult<()> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&ResendRequest {
                from: &self.from,
                to: [email.to.as_str()],
                subject: &email.subject,
                html: &email.html,
            })
            .send()
            .await
            .map_err(|e| StoreError::Email(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Email(format!("Resend HTTP {}: {}", status, body)));
        }

        let sent: ResendResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Email(format!("Unexpected Resend response: {}", e)))?;
        tracing::debug!("Resend accepted email {}", sent.id);
        Ok(())
    }
}

/// Mailer that writes to the log
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> StoreResult<()> {
        info!(to = %email.to, subject = %email.subject, "Email (not sent, Resend not configured)");
        Ok(())
    }
}

// =============================================================================
// Templates
// =============================================================================

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn line_rows(order: &Order) -> String {
    order
        .line_items
        .iter()
        .map(|item| {
            let name = match &item.variant {
                Some(v) => format!("{} ({})", escape(&item.name), escape(v)),
                None => escape(&item.name),
            };
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                name,
                item.quantity,
                item.total().display()
            )
        })
        .collect()
}

/// Sent to the customer when payment is confirmed
pub fn order_confirmation(order: &Order) -> Email {
    Email {
        to: order.customer.email.clone(),
        subject: format!("Your Atelier order {} is confirmed", order.number),
        html: format!(
            "<h1>Thank you, {}</h1>\
             <p>We have received payment for order <strong>{}</strong>.</p>\
             <table>{}</table>\
             <p>Total: <strong>{}</strong></p>",
            escape(&order.customer.first_name),
            order.number,
            line_rows(order),
            order.total().display()
        ),
    }
}

/// Sent to the customer after choosing bank transfer
pub fn bank_transfer_instructions(order: &Order, instructions: &BankInstructions) -> Email {
    let swift = instructions
        .swift
        .as_deref()
        .map(|s| format!("<li>SWIFT: {}</li>", escape(s)))
        .unwrap_or_default();

    Email {
        to: order.customer.email.clone(),
        subject: format!("Bank transfer details for order {}", order.number),
        html: format!(
            "<p>Please transfer <strong>{}</strong> to:</p>\
             <ul><li>Account name: {}</li><li>Account number: {}</li>\
             <li>Bank: {}</li><li>Branch: {}</li>{}</ul>\
             <p>Quote <strong>{}</strong> as the payment reference. \
             Your order ships once the transfer arrives.</p>",
            instructions.amount,
            escape(&instructions.account_name),
            escape(&instructions.account_number),
            escape(&instructions.bank_name),
            escape(&instructions.branch),
            swift,
            instructions.reference
        ),
    }
}

/// Sent to the shop when an order is placed
pub fn admin_new_order(order: &Order, admin_email: &str) -> Email {
    Email {
        to: admin_email.to_string(),
        subject: format!("New order {} ({})", order.number, order.total().display()),
        html: format!(
            "<p>{} &lt;{}&gt; placed order <strong>{}</strong> via {}.</p><table>{}</table>",
            escape(&order.customer.full_name()),
            escape(&order.customer.email),
            order.number,
            order.provider,
            line_rows(order)
        ),
    }
}
