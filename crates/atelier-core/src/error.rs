//! # Store Error Types
//!
//! Typed error handling for the Atelier storefront.
//! Catalog, cart, checkout and gateway operations all return `Result<T, StoreError>`.

use thiserror::Error;

/// Core error type for storefront operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Product not found in catalog
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// Order not found
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: String },

    /// Requested quantity exceeds what is in stock
    #[error("Only {available} of {product_id} in stock")]
    OutOfStock { product_id: String, available: u32 },

    /// Price mismatch or invalid amount
    #[error("Invalid price: {message}")]
    InvalidPrice { message: String },

    /// Currency not supported
    #[error("Unsupported currency: {currency}")]
    UnsupportedCurrency { currency: String },

    /// Order status change that the lifecycle does not allow
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Resource already exists (duplicate review, etc.)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with an external service
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Gateway notification signature verification failed
    #[error("Notification verification failed: {0}")]
    NotificationVerificationFailed(String),

    /// Gateway notification payload parsing error
    #[error("Notification parse error: {0}")]
    NotificationParseError(String),

    /// Checkout session creation failed
    #[error("Checkout creation failed: {0}")]
    CheckoutCreationFailed(String),

    /// Persistence backend error
    #[error("Database error: {0}")]
    Database(String),

    /// Email delivery error
    #[error("Email error: {0}")]
    Email(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::NetworkError(_)
                | StoreError::ProviderError { .. }
                | StoreError::Database(_)
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::Configuration(_) => 500,
            StoreError::InvalidRequest(_) => 400,
            StoreError::ProductNotFound { .. } => 404,
            StoreError::OrderNotFound { .. } => 404,
            StoreError::OutOfStock { .. } => 409,
            StoreError::InvalidPrice { .. } => 400,
            StoreError::UnsupportedCurrency { .. } => 400,
            StoreError::InvalidTransition { .. } => 409,
            StoreError::Conflict(_) => 409,
            StoreError::ProviderError { .. } => 502,
            StoreError::NetworkError(_) => 503,
            StoreError::NotificationVerificationFailed(_) => 401,
            StoreError::NotificationParseError(_) => 400,
            StoreError::CheckoutCreationFailed(_) => 500,
            StoreError::Database(_) => 500,
            StoreError::Email(_) => 502,
            StoreError::Internal(_) => 500,
            StoreError::Serialization(_) => 500,
        }
    }

    /// Shorthand for an error reported by a payment provider
    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        StoreError::ProviderError {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for storefront operations
pub type StoreResult<T> = Result<T, StoreError>;
