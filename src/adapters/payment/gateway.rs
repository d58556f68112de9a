//! HTTP implementation of the PaymentGateway port.
//!
//! Refund instructions go out over REST with the booking external id as the
//! idempotency key; inbound callbacks are verified with HMAC-SHA256 before
//! parsing.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::ExternalId;
use crate::ports::{
    PaymentCallback, PaymentCallbackKind, PaymentGateway, PaymentGatewayError, RefundInstruction,
};

use super::WebhookVerifier;

/// Gateway connection settings.
#[derive(Clone)]
pub struct PaymentGatewayConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
    pub webhook_secret: Secret<String>,
}

/// HTTP adapter for the external payment collaborator.
pub struct HttpPaymentGateway {
    config: PaymentGatewayConfig,
    client: reqwest::Client,
    verifier: WebhookVerifier,
}

impl HttpPaymentGateway {
    /// Creates a new gateway adapter.
    pub fn new(config: PaymentGatewayConfig) -> Self {
        let verifier = WebhookVerifier::new(config.webhook_secret.clone());
        Self {
            config,
            client: reqwest::Client::new(),
            verifier,
        }
    }
}

#[derive(Serialize)]
struct RefundRequest<'a> {
    idempotency_key: String,
    payment_id: Option<&'a str>,
    amount: String,
    reason: &'a str,
}

/// Raw callback payload as delivered by the gateway.
#[derive(Deserialize)]
struct CallbackPayload {
    event: String,
    booking_id: Uuid,
    payment_method: Option<String>,
    payment_id: Option<String>,
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn request_refund(
        &self,
        instruction: RefundInstruction,
    ) -> Result<(), PaymentGatewayError> {
        let url = format!("{}/v1/refunds", self.config.base_url);
        let body = RefundRequest {
            idempotency_key: instruction.booking_external_id.to_string(),
            payment_id: instruction.payment_id.as_deref(),
            amount: instruction.amount.to_string(),
            reason: &instruction.reason,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentGatewayError::network(format!("Refund request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(
                booking = %instruction.booking_external_id,
                amount = %instruction.amount,
                "refund instruction accepted"
            );
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            Err(PaymentGatewayError::network(format!(
                "Gateway returned {}: {}",
                status, detail
            )))
        } else {
            Err(PaymentGatewayError::rejected(format!(
                "Gateway rejected refund ({}): {}",
                status, detail
            )))
        }
    }

    fn verify_callback(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<PaymentCallback, PaymentGatewayError> {
        self.verifier.verify(payload, signature)?;

        let raw: CallbackPayload = serde_json::from_slice(payload).map_err(|e| {
            PaymentGatewayError::rejected(format!("Invalid callback payload: {}", e))
        })?;

        let kind = match raw.event.as_str() {
            "payment.succeeded" => PaymentCallbackKind::Succeeded,
            "payment.failed" => PaymentCallbackKind::Failed,
            "payment.refunded" => PaymentCallbackKind::Refunded,
            "payment.partially_paid" => PaymentCallbackKind::PartiallyPaid,
            other => {
                return Err(PaymentGatewayError::rejected(format!(
                    "Unsupported callback event: {}",
                    other
                )))
            }
        };

        Ok(PaymentCallback {
            booking_external_id: ExternalId::from_uuid(raw.booking_id),
            kind,
            payment_method: raw.payment_method,
            payment_id: raw.payment_id,
        })
    }
}
