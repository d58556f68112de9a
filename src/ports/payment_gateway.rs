//! Payment gateway port.
//!
//! The booking core never executes payments itself. It emits refund
//! instructions to the gateway and consumes verified payment callbacks
//! from it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::booking::PaymentStatus;
use crate::domain::foundation::{DomainError, ErrorCode, ExternalId, Money};

/// Instruction to refund a booking's payment.
///
/// The booking external id doubles as the idempotency key, so the gateway
/// can deduplicate redelivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundInstruction {
    pub booking_external_id: ExternalId,
    pub payment_id: Option<String>,
    pub amount: Money,
    pub reason: String,
}

/// Kind of payment outcome reported by the gateway's callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentCallbackKind {
    Succeeded,
    Failed,
    Refunded,
    PartiallyPaid,
}

impl PaymentCallbackKind {
    /// Maps the callback kind to the booking's payment status.
    pub fn payment_status(&self) -> PaymentStatus {
        match self {
            PaymentCallbackKind::Succeeded => PaymentStatus::Paid,
            PaymentCallbackKind::Failed => PaymentStatus::Failed,
            PaymentCallbackKind::Refunded => PaymentStatus::Refunded,
            PaymentCallbackKind::PartiallyPaid => PaymentStatus::Partial,
        }
    }
}

/// Verified payment callback payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentCallback {
    pub booking_external_id: ExternalId,
    pub kind: PaymentCallbackKind,
    pub payment_method: Option<String>,
    pub payment_id: Option<String>,
}

/// Port for the external payment collaborator.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Sends a refund instruction. Must be safe to retry.
    async fn request_refund(
        &self,
        instruction: RefundInstruction,
    ) -> Result<(), PaymentGatewayError>;

    /// Verifies a callback signature and parses the payload.
    fn verify_callback(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<PaymentCallback, PaymentGatewayError>;
}

/// Errors from payment gateway operations.
#[derive(Debug, Clone)]
pub struct PaymentGatewayError {
    pub message: String,
    pub retryable: bool,
    pub invalid_signature: bool,
}

impl PaymentGatewayError {
    /// A transport-level failure worth retrying.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
            invalid_signature: false,
        }
    }

    /// The gateway rejected the request.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
            invalid_signature: false,
        }
    }

    /// The callback signature did not verify.
    pub fn invalid_signature() -> Self {
        Self {
            message: "Callback signature verification failed".to_string(),
            retryable: false,
            invalid_signature: true,
        }
    }
}

impl fmt::Display for PaymentGatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PaymentGatewayError {}

impl From<PaymentGatewayError> for DomainError {
    fn from(err: PaymentGatewayError) -> Self {
        let code = if err.invalid_signature {
            ErrorCode::InvalidWebhookSignature
        } else {
            ErrorCode::PaymentGatewayError
        };
        DomainError::new(code, err.message)
    }
}
