//! Booking aggregate entity.
//!
//! The aggregate composes the code generator, the monetary calculator, and
//! the lifecycle state machine, and enforces cross-field invariants on every
//! mutation.
//!
//! # Invariants
//!
//! - `total_amount` always equals base + addons + tax - discount
//! - `provider_id` may be absent only while pending or confirmed
//! - cancellation fields are populated iff status is cancelled
//! - `booking_code` is assigned once at creation and never regenerated
//!   after a successful insert
//! - ratings are settable only once the booking is completed, and are
//!   immutable once set
//! - bookings are never deleted; terminal bookings are retained for audit

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    compute_total, AddressId, BookingId, DomainError, ErrorCode, ExternalId, Money, Rating,
    ServiceId, Timestamp, UserId,
};

use super::{
    BookingCode, BookingFacts, BookingStatus, CancelledBy, PaymentStatus, TimeSlot,
    TransitionEffect, TransitionPlan,
};

/// The booking aggregate root.
///
/// `id` is assigned by the persistence layer on insert; `version` backs
/// optimistic concurrency on every subsequent write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Option<BookingId>,
    pub external_id: ExternalId,
    pub booking_code: BookingCode,
    pub customer_id: UserId,
    pub service_id: ServiceId,
    pub provider_id: Option<UserId>,
    pub address_id: AddressId,
    pub schedule_date: NaiveDate,
    pub schedule_time: TimeSlot,
    pub preferred_time: Option<String>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub base_price: Money,
    pub addons_total: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub total_amount: Money,
    pub payment_method: Option<String>,
    pub payment_id: Option<String>,
    pub special_instructions: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<CancelledBy>,
    pub cancellation_charge: Money,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub provider_rating: Option<Rating>,
    pub provider_feedback: Option<String>,
    pub customer_rating: Option<Rating>,
    pub customer_feedback: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub version: i32,
}

/// Validated input for creating a booking.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_id: UserId,
    pub service_id: ServiceId,
    pub address_id: AddressId,
    pub schedule_date: NaiveDate,
    pub schedule_time: TimeSlot,
    pub preferred_time: Option<String>,
    pub base_price: Money,
    pub addons_total: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub special_instructions: Option<String>,
}

/// Which side of the booking is recording a rating.
///
/// The customer rates the provider's work; the provider rates the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaterRole {
    Customer,
    Provider,
}

/// Payment outcome delivered by the payment collaborator's callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub payment_id: Option<String>,
}

impl Booking {
    /// Creates a new pending booking.
    ///
    /// Derives the total from the monetary components, generates the
    /// external id and booking code, and rejects schedule dates in the past.
    /// Referential validation of customer/service/address happens in the
    /// application layer before this is called.
    pub fn create(input: NewBooking, now: Timestamp) -> Result<Self, DomainError> {
        if input.schedule_date < now.date() {
            return Err(DomainError::new(
                ErrorCode::InvalidSchedule,
                "schedule_date cannot be in the past",
            ));
        }

        let total_amount = compute_total(
            input.base_price,
            input.addons_total,
            input.tax_amount,
            input.discount_amount,
        )?;

        Ok(Self {
            id: None,
            external_id: ExternalId::new(),
            booking_code: BookingCode::generate(&now),
            customer_id: input.customer_id,
            service_id: input.service_id,
            provider_id: None,
            address_id: input.address_id,
            schedule_date: input.schedule_date,
            schedule_time: input.schedule_time,
            preferred_time: input.preferred_time,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            base_price: input.base_price,
            addons_total: input.addons_total,
            discount_amount: input.discount_amount,
            tax_amount: input.tax_amount,
            total_amount,
            payment_method: None,
            payment_id: None,
            special_instructions: input.special_instructions,
            cancellation_reason: None,
            cancelled_by: None,
            cancellation_charge: Money::ZERO,
            start_time: None,
            end_time: None,
            provider_rating: None,
            provider_feedback: None,
            customer_rating: None,
            customer_feedback: None,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Replaces the booking code with a freshly generated one.
    ///
    /// Only legal before the first successful insert; used by the create
    /// workflow when the uniqueness constraint rejects a collision.
    pub fn regenerate_code(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.id.is_some() {
            return Err(DomainError::new(
                ErrorCode::InvalidState,
                "booking_code is immutable once persisted",
            ));
        }
        self.booking_code = BookingCode::generate(&now);
        Ok(())
    }

    /// Facts the transition planner needs about this booking.
    pub fn facts(&self) -> BookingFacts {
        BookingFacts {
            start_time_set: self.start_time.is_some(),
        }
    }

    /// The moment the booked slot opens, for the soft start-time check.
    pub fn schedule_window_start(&self) -> Timestamp {
        self.schedule_time.window_start(self.schedule_date)
    }

    /// Applies a planned transition's status change and field effects.
    ///
    /// The `RequestRefund` effect carries no field mutation; dispatching it
    /// to the payment collaborator is the caller's responsibility.
    pub fn apply_transition(&mut self, plan: &TransitionPlan, now: Timestamp) {
        self.status = plan.next_status;
        for effect in &plan.effects {
            match effect {
                TransitionEffect::AssignProvider(provider_id) => {
                    self.provider_id = Some(*provider_id);
                }
                TransitionEffect::SetStartTime(at) => self.start_time = Some(*at),
                TransitionEffect::SetEndTime(at) => self.end_time = Some(*at),
                TransitionEffect::RecordCancellation(cancellation) => {
                    self.cancellation_reason = Some(cancellation.reason.clone());
                    self.cancelled_by = Some(cancellation.cancelled_by);
                    self.cancellation_charge = cancellation.charge;
                }
                TransitionEffect::RequestRefund => {}
            }
        }
        self.updated_at = now;
    }

    /// Records a rating and optional feedback for one side of the booking.
    ///
    /// Allowed only once the booking is completed, and only once per side.
    pub fn record_rating(
        &mut self,
        role: RaterRole,
        rating: Rating,
        feedback: Option<String>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        if self.status != BookingStatus::Completed {
            return Err(DomainError::new(
                ErrorCode::InvalidState,
                format!("Ratings require a completed booking, status is {}", self.status),
            ));
        }
        let (slot, feedback_slot) = match role {
            RaterRole::Customer => (&mut self.provider_rating, &mut self.provider_feedback),
            RaterRole::Provider => (&mut self.customer_rating, &mut self.customer_feedback),
        };
        if slot.is_some() {
            return Err(DomainError::new(
                ErrorCode::AlreadySet,
                "Rating has already been recorded",
            ));
        }
        *slot = Some(rating);
        *feedback_slot = feedback;
        self.updated_at = now;
        Ok(())
    }

    /// Applies a payment outcome from the payment collaborator.
    ///
    /// Re-delivery of an identical outcome is a no-op, keeping webhook
    /// handling idempotent.
    pub fn record_payment(&mut self, outcome: PaymentOutcome, now: Timestamp) -> bool {
        let unchanged = self.payment_status == outcome.status
            && self.payment_id == outcome.payment_id;
        if unchanged {
            return false;
        }
        self.payment_status = outcome.status;
        if outcome.payment_method.is_some() {
            self.payment_method = outcome.payment_method;
        }
        if outcome.payment_id.is_some() {
            self.payment_id = outcome.payment_id;
        }
        self.updated_at = now;
        true
    }

    /// Recomputes the total from the stored components.
    pub fn recomputed_total(&self) -> Result<Money, DomainError> {
        Ok(compute_total(
            self.base_price,
            self.addons_total,
            self.tax_amount,
            self.discount_amount,
        )?)
    }

    /// True when the stored total matches its derivation (no-drift invariant).
    pub fn total_is_consistent(&self) -> bool {
        self.recomputed_total()
            .map(|t| t == self.total_amount)
            .unwrap_or(false)
    }
}
