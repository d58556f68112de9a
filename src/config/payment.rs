//! Payment gateway configuration.

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Payment gateway connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Gateway REST base URL.
    pub base_url: String,

    /// API key for outbound refund instructions.
    pub api_key: Secret<String>,

    /// HMAC secret for inbound callback signatures.
    pub webhook_secret: Secret<String>,
}

impl PaymentConfig {
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__BASE_URL"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidGatewayUrl);
        }
        if *environment == Environment::Production && !self.base_url.starts_with("https://") {
            return Err(ValidationError::GatewayMustBeHttps);
        }
        if self.api_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__API_KEY"));
        }
        if self.webhook_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__WEBHOOK_SECRET"));
        }
        Ok(())
    }
}
