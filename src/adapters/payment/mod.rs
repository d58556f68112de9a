//! HTTP payment gateway adapter.

mod gateway;
mod signature;

pub use gateway::{HttpPaymentGateway, PaymentGatewayConfig};
pub use signature::{SignatureHeader, WebhookVerifier};
