//! # Gateway Configuration
//!
//! Configuration for each payment gateway.
//! All secrets are loaded from environment variables; a gateway whose
//! variables are missing is simply not registered.

use atelier_core::StoreError;
use std::env;

fn required(name: &str) -> Result<String, StoreError> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| StoreError::Configuration(format!("{} not set", name)))
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Boolean env flag ("true"/"1"/"yes"), falling back to `default`
fn flag(name: &str, default: bool) -> bool {
    match optional(name) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        None => default,
    }
}

pub const PAYHERE_SANDBOX_URL: &str = "https://sandbox.payhere.lk/pay/checkout";
pub const PAYHERE_LIVE_URL: &str = "https://www.payhere.lk/pay/checkout";

/// PayHere merchant configuration
#[derive(Debug, Clone)]
pub struct PayHereConfig {
    pub merchant_id: String,
    pub merchant_secret: String,
    /// Hosted checkout form target
    pub checkout_url: String,
}

impl PayHereConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `PAYHERE_MERCHANT_ID`
    /// - `PAYHERE_MERCHANT_SECRET`
    ///
    /// `PAYHERE_SANDBOX` (default true) picks the sandbox checkout.
    pub fn from_env() -> Result<Self, StoreError> {
        dotenvy::dotenv().ok();

        let merchant_id = required("PAYHERE_MERCHANT_ID")?;
        let merchant_secret = required("PAYHERE_MERCHANT_SECRET")?;
        let sandbox = flag("PAYHERE_SANDBOX", true);

        Ok(Self {
            merchant_id,
            merchant_secret,
            checkout_url: if sandbox { PAYHERE_SANDBOX_URL } else { PAYHERE_LIVE_URL }.to_string(),
        })
    }

    /// Create config with explicit values (sandbox)
    pub fn new(merchant_id: impl Into<String>, merchant_secret: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            merchant_secret: merchant_secret.into(),
            checkout_url: PAYHERE_SANDBOX_URL.to_string(),
        }
    }

    pub fn is_sandbox(&self) -> bool {
        self.checkout_url == PAYHERE_SANDBOX_URL
    }
}

pub const PAYZY_DEFAULT_CHECKOUT_URL: &str = "https://api.payzy.lk/checkout/custom-checkout";

/// Payzy shop configuration
#[derive(Debug, Clone)]
pub struct PayzyConfig {
    pub shop_id: String,
    pub secret_key: String,
    pub checkout_url: String,
    pub test_mode: bool,
}

impl PayzyConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `PAYZY_SHOP_ID`
    /// - `PAYZY_SECRET_KEY`
    ///
    /// Optional: `PAYZY_CHECKOUT_URL`, `PAYZY_TEST_MODE` (default true).
    pub fn from_env() -> Result<Self, StoreError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            shop_id: required("PAYZY_SHOP_ID")?,
            secret_key: required("PAYZY_SECRET_KEY")?,
            checkout_url: optional("PAYZY_CHECKOUT_URL")
                .unwrap_or_else(|| PAYZY_DEFAULT_CHECKOUT_URL.to_string()),
            test_mode: flag("PAYZY_TEST_MODE", true),
        })
    }

    pub fn new(shop_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            shop_id: shop_id.into(),
            secret_key: secret_key.into(),
            checkout_url: PAYZY_DEFAULT_CHECKOUT_URL.to_string(),
            test_mode: true,
        }
    }
}

pub const PAYPAL_SANDBOX_API: &str = "https://api-m.sandbox.paypal.com";

/// PayPal REST app credentials
#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: String,
    /// API base URL (sandbox by default; overridable for mocking)
    pub api_base_url: String,
}

impl PayPalConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `PAYPAL_CLIENT_ID`
    /// - `PAYPAL_CLIENT_SECRET`
    ///
    /// Optional: `PAYPAL_API_BASE` (e.g. `https://api-m.paypal.com` for live).
    pub fn from_env() -> Result<Self, StoreError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            client_id: required("PAYPAL_CLIENT_ID")?,
            client_secret: required("PAYPAL_CLIENT_SECRET")?,
            api_base_url: optional("PAYPAL_API_BASE").unwrap_or_else(|| PAYPAL_SANDBOX_API.to_string()),
        })
    }

    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_base_url: PAYPAL_SANDBOX_API.to_string(),
        }
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_sandbox(&self) -> bool {
        self.api_base_url.contains("sandbox")
    }
}

pub const BRAINTREE_SANDBOX_URL: &str = "https://payments.sandbox.braintree-api.com/graphql";
pub const BRAINTREE_LIVE_URL: &str = "https://payments.braintree-api.com/graphql";

/// Braintree API keys
#[derive(Debug, Clone)]
pub struct BraintreeConfig {
    pub merchant_id: String,
    pub public_key: String,
    pub private_key: String,
    /// GraphQL endpoint
    pub api_url: String,
}

impl BraintreeConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `BRAINTREE_MERCHANT_ID`
    /// - `BRAINTREE_PUBLIC_KEY`
    /// - `BRAINTREE_PRIVATE_KEY`
    ///
    /// `BRAINTREE_SANDBOX` (default true) picks the sandbox endpoint.
    pub fn from_env() -> Result<Self, StoreError> {
        dotenvy::dotenv().ok();

        let sandbox = flag("BRAINTREE_SANDBOX", true);
        Ok(Self {
            merchant_id: required("BRAINTREE_MERCHANT_ID")?,
            public_key: required("BRAINTREE_PUBLIC_KEY")?,
            private_key: required("BRAINTREE_PRIVATE_KEY")?,
            api_url: if sandbox { BRAINTREE_SANDBOX_URL } else { BRAINTREE_LIVE_URL }.to_string(),
        })
    }

    pub fn new(
        merchant_id: impl Into<String>,
        public_key: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            public_key: public_key.into(),
            private_key: private_key.into(),
            api_url: BRAINTREE_SANDBOX_URL.to_string(),
        }
    }

    /// Builder: set custom API URL (for testing)
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

/// Account details for manual bank transfers
#[derive(Debug, Clone)]
pub struct BankTransferConfig {
    pub account_name: String,
    pub account_number: String,
    pub bank_name: String,
    pub branch: String,
    pub swift: Option<String>,
}

impl BankTransferConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `BANK_ACCOUNT_NAME`
    /// - `BANK_ACCOUNT_NUMBER`
    /// - `BANK_NAME`
    /// - `BANK_BRANCH`
    ///
    /// Optional: `BANK_SWIFT`.
    pub fn from_env() -> Result<Self, StoreError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            account_name: required("BANK_ACCOUNT_NAME")?,
            account_number: required("BANK_ACCOUNT_NUMBER")?,
            bank_name: required("BANK_NAME")?,
            branch: required("BANK_BRANCH")?,
            swift: optional("BANK_SWIFT"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payhere_defaults_to_sandbox() {
        let config = PayHereConfig::new("1221149", "secret");
        assert!(config.is_sandbox());
        assert_eq!(config.checkout_url, PAYHERE_SANDBOX_URL);
    }

    #[test]
    fn test_paypal_base_url_override() {
        let config = PayPalConfig::new("id", "secret").with_api_base_url("http://127.0.0.1:9999/");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9999");
        assert!(!config.is_sandbox());
        assert!(PayPalConfig::new("id", "secret").is_sandbox());
    }

    #[test]
    fn test_from_env_missing_key() {
        env::remove_var("BRAINTREE_MERCHANT_ID");

        let result = BraintreeConfig::from_env();
        assert!(matches!(result, Err(StoreError::Configuration(_))));
    }
}
