//! Domain events emitted by booking operations.
//!
//! Events reference bookings by external id only; internal ids never leave
//! the service.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ExternalId, Money, Rating, Timestamp, UserId};

use super::{BookingStatus, CancelledBy, PaymentStatus, RaterRole, Trigger};

/// Something that happened to a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingEvent {
    Created {
        external_id: ExternalId,
        booking_code: String,
        customer_id: UserId,
        total_amount: Money,
        occurred_at: Timestamp,
    },
    StatusChanged {
        external_id: ExternalId,
        from: BookingStatus,
        to: BookingStatus,
        trigger: Trigger,
        occurred_at: Timestamp,
    },
    Cancelled {
        external_id: ExternalId,
        cancelled_by: CancelledBy,
        refund_requested: bool,
        occurred_at: Timestamp,
    },
    PaymentRecorded {
        external_id: ExternalId,
        payment_status: PaymentStatus,
        occurred_at: Timestamp,
    },
    RatingRecorded {
        external_id: ExternalId,
        role: RaterRole,
        rating: Rating,
        occurred_at: Timestamp,
    },
}

impl BookingEvent {
    /// Short event name for logging and channel routing.
    pub fn name(&self) -> &'static str {
        match self {
            BookingEvent::Created { .. } => "booking.created",
            BookingEvent::StatusChanged { .. } => "booking.status_changed",
            BookingEvent::Cancelled { .. } => "booking.cancelled",
            BookingEvent::PaymentRecorded { .. } => "booking.payment_recorded",
            BookingEvent::RatingRecorded { .. } => "booking.rating_recorded",
        }
    }

    /// The booking this event concerns.
    pub fn external_id(&self) -> ExternalId {
        match self {
            BookingEvent::Created { external_id, .. }
            | BookingEvent::StatusChanged { external_id, .. }
            | BookingEvent::Cancelled { external_id, .. }
            | BookingEvent::PaymentRecorded { external_id, .. }
            | BookingEvent::RatingRecorded { external_id, .. } => *external_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_tagged_type() {
        let event = BookingEvent::StatusChanged {
            external_id: ExternalId::new(),
            from: BookingStatus::Pending,
            to: BookingStatus::Confirmed,
            trigger: Trigger::Confirm,
            occurred_at: Timestamp::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status_changed");
        assert_eq!(json["from"], "pending");
        assert_eq!(json["to"], "confirmed");
    }

    #[test]
    fn name_and_external_id_are_stable() {
        let id = ExternalId::new();
        let event = BookingEvent::Cancelled {
            external_id: id,
            cancelled_by: CancelledBy::Customer,
            refund_requested: true,
            occurred_at: Timestamp::now(),
        };
        assert_eq!(event.name(), "booking.cancelled");
        assert_eq!(event.external_id(), id);
    }
}
