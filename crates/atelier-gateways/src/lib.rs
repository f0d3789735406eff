//! # atelier-gateways
//!
//! Payment gateway strategies for the Atelier storefront.
//!
//! | Strategy               | Hand-off      | Result arrives via          |
//! |------------------------|---------------|-----------------------------|
//! | `PayHereStrategy`      | signed form   | `/notify/payhere` (MD5)     |
//! | `PayzyStrategy`        | signed form   | `/notify/payzy` (HMAC)      |
//! | `PayPalStrategy`       | redirect      | server-side capture         |
//! | `BraintreeStrategy`    | client token  | server-side nonce charge    |
//! | `BankTransferStrategy` | instructions  | admin confirmation          |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use atelier_gateways::PayHereStrategy;
//! use atelier_core::{CheckoutUrls, PaymentStrategy};
//!
//! let strategy = PayHereStrategy::from_env()?;
//! let session = strategy.create_checkout(&order, &urls).await?;
//! // session.action is a FormPost the browser submits to PayHere
//! ```
//!
//! ## Notifications
//!
//! ```rust,ignore
//! use atelier_gateways::{dispatch_notification, NotificationHandler};
//!
//! let event = strategy.verify_notification(&body, None).await?;
//! dispatch_notification(&my_handler, &event).await?;
//! ```

pub mod bank_transfer;
pub mod braintree;
pub mod config;
pub mod notification;
pub mod payhere;
pub mod paypal;
pub mod payzy;
pub mod signature;

// Re-exports
pub use bank_transfer::BankTransferStrategy;
pub use braintree::BraintreeStrategy;
pub use config::{BankTransferConfig, BraintreeConfig, PayHereConfig, PayPalConfig, PayzyConfig};
pub use notification::{
    dispatch_notification, notify_endpoints, LoggingNotificationHandler, NotificationHandler,
    NOTIFYING_PROVIDERS,
};
pub use payhere::{PayHereNotification, PayHereStrategy};
pub use paypal::PayPalStrategy;
pub use payzy::PayzyStrategy;
