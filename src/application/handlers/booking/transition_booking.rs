//! TransitionBookingHandler - applies lifecycle triggers to persisted bookings.
//!
//! The read-modify-write is protected by optimistic concurrency: the update
//! is conditional on the version read here, and a concurrent writer turns
//! into a Conflict for the loser.

use std::sync::Arc;

use crate::domain::booking::{
    plan, Booking, BookingEvent, BookingStatus, CancellationRequest, TransitionContext, Trigger,
};
use crate::domain::foundation::{DomainError, ErrorCode, ExternalId, Money, Timestamp, UserId};
use crate::domain::user::UserRole;
use crate::ports::{
    BookingRepository, EventPublisher, PaymentGateway, ReferenceChecker, RefundInstruction,
};

/// The authenticated actor firing a trigger.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: UserId,
    pub role: UserRole,
}

/// Command to apply a lifecycle trigger to a booking.
///
/// The current status is deliberately absent: transitions validate against
/// the persisted state, never a caller-claimed one.
#[derive(Debug, Clone)]
pub struct TransitionBookingCommand {
    pub external_id: ExternalId,
    pub trigger: Trigger,
    pub actor: Actor,
    pub provider_id: Option<UserId>,
    pub cancellation: Option<CancellationRequest>,
}

/// Handler for booking lifecycle transitions.
pub struct TransitionBookingHandler {
    repository: Arc<dyn BookingRepository>,
    references: Arc<dyn ReferenceChecker>,
    payment_gateway: Arc<dyn PaymentGateway>,
    events: Arc<dyn EventPublisher>,
}

impl TransitionBookingHandler {
    pub fn new(
        repository: Arc<dyn BookingRepository>,
        references: Arc<dyn ReferenceChecker>,
        payment_gateway: Arc<dyn PaymentGateway>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            references,
            payment_gateway,
            events,
        }
    }

    pub async fn handle(&self, cmd: TransitionBookingCommand) -> Result<Booking, DomainError> {
        let mut booking = self
            .repository
            .find_by_external_id(&cmd.external_id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::BookingNotFound, "Booking not found"))?;

        authorize(&cmd.actor, cmd.trigger, &booking)?;

        if cmd.trigger == Trigger::Assign {
            if let Some(provider_id) = cmd.provider_id {
                let provider = self
                    .references
                    .find_live_user(provider_id)
                    .await?
                    .ok_or_else(|| {
                        DomainError::new(ErrorCode::UserNotFound, "Provider not found")
                    })?;
                if provider.role != UserRole::Provider {
                    return Err(DomainError::new(
                        ErrorCode::ValidationFailed,
                        "Assigned user is not a provider",
                    ));
                }
            }
        }

        let now = Timestamp::now();
        let context = TransitionContext {
            provider_id: cmd.provider_id,
            cancellation: cmd.cancellation,
            now,
        };
        let transition = plan(
            booking.status,
            booking.payment_status,
            cmd.trigger,
            &context,
            booking.facts(),
        )?;

        // Soft check only: starting early is logged, not rejected.
        if cmd.trigger == Trigger::Start && now.is_before(&booking.schedule_window_start()) {
            tracing::warn!(
                booking = %booking.external_id,
                window_start = %booking.schedule_window_start(),
                "work started before the scheduled window"
            );
        }

        let previous_status = booking.status;
        let expected_version = booking.version;
        booking.apply_transition(&transition, now);
        let persisted = self
            .repository
            .update_conditional(&booking, expected_version)
            .await?;

        if transition.requests_refund() {
            let instruction = RefundInstruction {
                booking_external_id: persisted.external_id,
                payment_id: persisted.payment_id.clone(),
                amount: refundable_amount(&persisted),
                reason: persisted
                    .cancellation_reason
                    .clone()
                    .unwrap_or_else(|| "booking cancelled".to_string()),
            };
            // The transition is already committed; a gateway failure here is
            // reported but cannot roll it back.
            if let Err(err) = self.payment_gateway.request_refund(instruction).await {
                tracing::error!(
                    booking = %persisted.external_id,
                    error = %err,
                    "refund instruction failed"
                );
            }
        }

        let event = match persisted.status {
            BookingStatus::Cancelled => BookingEvent::Cancelled {
                external_id: persisted.external_id,
                cancelled_by: persisted
                    .cancelled_by
                    .unwrap_or(crate::domain::booking::CancelledBy::System),
                refund_requested: transition.requests_refund(),
                occurred_at: now,
            },
            _ => BookingEvent::StatusChanged {
                external_id: persisted.external_id,
                from: previous_status,
                to: persisted.status,
                trigger: cmd.trigger,
                occurred_at: now,
            },
        };
        if let Err(err) = self.events.publish(event).await {
            tracing::warn!(error = %err, "failed to publish booking event");
        }

        tracing::info!(
            booking = %persisted.external_id,
            from = %previous_status,
            to = %persisted.status,
            trigger = %cmd.trigger,
            "booking transitioned"
        );
        Ok(persisted)
    }
}

/// Role and ownership gate for triggers. Admins may fire anything.
fn authorize(actor: &Actor, trigger: Trigger, booking: &Booking) -> Result<(), DomainError> {
    if actor.role == UserRole::Admin {
        return Ok(());
    }
    let allowed = match trigger {
        Trigger::Confirm => {
            actor.role == UserRole::Customer && booking.customer_id == actor.user_id
        }
        Trigger::Reject => actor.role == UserRole::Provider,
        Trigger::Assign => actor.role == UserRole::Provider,
        Trigger::Start | Trigger::Complete => {
            actor.role == UserRole::Provider && booking.provider_id == Some(actor.user_id)
        }
        Trigger::Cancel => match actor.role {
            UserRole::Customer => booking.customer_id == actor.user_id,
            UserRole::Provider => booking.provider_id == Some(actor.user_id),
            UserRole::Admin => true,
        },
    };
    if allowed {
        Ok(())
    } else {
        Err(DomainError::new(
            ErrorCode::Forbidden,
            format!("{} may not {} this booking", actor.role, trigger),
        ))
    }
}

/// Refund amount: the derived total minus the cancellation charge,
/// floored at zero.
fn refundable_amount(booking: &Booking) -> Money {
    let total = booking.total_amount.minor_units();
    let charge = booking.cancellation_charge.minor_units();
    Money::from_minor_units((total - charge).max(0)).unwrap_or(Money::ZERO)
}
