//! HandlePaymentWebhookHandler - signed payment callbacks from the gateway.
//!
//! Gateways redeliver callbacks, so recording a payment outcome is
//! idempotent: a repeat of an already-applied outcome is acknowledged
//! without touching storage.

use std::sync::Arc;

use crate::domain::booking::{Booking, BookingEvent, PaymentOutcome};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::{BookingRepository, EventPublisher, PaymentGateway};

#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    pub payload: Vec<u8>,
    pub signature: String,
}

pub struct HandlePaymentWebhookHandler {
    repository: Arc<dyn BookingRepository>,
    payment_gateway: Arc<dyn PaymentGateway>,
    events: Arc<dyn EventPublisher>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        repository: Arc<dyn BookingRepository>,
        payment_gateway: Arc<dyn PaymentGateway>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            payment_gateway,
            events,
        }
    }

    pub async fn handle(&self, cmd: HandlePaymentWebhookCommand) -> Result<Booking, DomainError> {
        let callback = self
            .payment_gateway
            .verify_callback(&cmd.payload, &cmd.signature)?;

        let mut booking = self
            .repository
            .find_by_external_id(&callback.booking_external_id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::BookingNotFound, "Booking not found"))?;

        let now = Timestamp::now();
        let expected_version = booking.version;
        let outcome = PaymentOutcome {
            status: callback.kind.payment_status(),
            payment_method: callback.payment_method.clone(),
            payment_id: callback.payment_id.clone(),
        };
        let changed = booking.record_payment(outcome, now);
        if !changed {
            tracing::info!(
                booking = %booking.external_id,
                payment_status = ?booking.payment_status,
                "duplicate payment callback ignored"
            );
            return Ok(booking);
        }

        let persisted = self
            .repository
            .update_conditional(&booking, expected_version)
            .await?;

        let event = BookingEvent::PaymentRecorded {
            external_id: persisted.external_id,
            payment_status: persisted.payment_status,
            occurred_at: now,
        };
        if let Err(err) = self.events.publish(event).await {
            tracing::warn!(error = %err, "failed to publish booking event");
        }

        tracing::info!(
            booking = %persisted.external_id,
            payment_status = ?persisted.payment_status,
            "payment recorded from callback"
        );
        Ok(persisted)
    }
}
