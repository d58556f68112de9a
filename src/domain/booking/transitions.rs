//! Pure transition planning for the booking lifecycle.
//!
//! Given the persisted status, payment status, a trigger, and its context,
//! [`plan`] either returns the next status plus side-effect instructions or
//! rejects the request. It never touches storage; applying the plan and
//! persisting atomically is the application layer's job.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{DomainError, ErrorCode, Money, Timestamp, UserId, ValidationError};

use super::{BookingStatus, CancelledBy, PaymentStatus};

/// Actor-initiated trigger requesting a lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Confirm,
    Reject,
    Assign,
    Start,
    Complete,
    Cancel,
}

impl Trigger {
    /// The status this trigger requests.
    pub fn target_status(&self) -> BookingStatus {
        match self {
            Trigger::Confirm => BookingStatus::Confirmed,
            Trigger::Reject => BookingStatus::Rejected,
            Trigger::Assign => BookingStatus::Assigned,
            Trigger::Start => BookingStatus::Ongoing,
            Trigger::Complete => BookingStatus::Completed,
            Trigger::Cancel => BookingStatus::Cancelled,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trigger::Confirm => "confirm",
            Trigger::Reject => "reject",
            Trigger::Assign => "assign",
            Trigger::Start => "start",
            Trigger::Complete => "complete",
            Trigger::Cancel => "cancel",
        };
        write!(f, "{}", s)
    }
}

/// Cancellation details supplied with a Cancel trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationRequest {
    pub reason: String,
    pub cancelled_by: CancelledBy,
    pub charge: Money,
}

/// Caller-supplied context for a transition attempt.
///
/// Note the absence of a current-status field: transitions always validate
/// against the persisted state, never a caller-claimed one.
#[derive(Debug, Clone)]
pub struct TransitionContext {
    /// Provider to assign (Assign trigger only).
    pub provider_id: Option<UserId>,
    /// Cancellation details (Cancel trigger only).
    pub cancellation: Option<CancellationRequest>,
    /// The moment of the attempt; recorded as start/end time.
    pub now: Timestamp,
}

impl TransitionContext {
    /// Context carrying only the current moment.
    pub fn at(now: Timestamp) -> Self {
        Self {
            provider_id: None,
            cancellation: None,
            now,
        }
    }
}

/// A field mutation the aggregate must apply alongside the status change.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionEffect {
    AssignProvider(UserId),
    SetStartTime(Timestamp),
    SetEndTime(Timestamp),
    RecordCancellation(CancellationRequest),
    /// Instruct the external payment collaborator to refund the booking.
    /// Emitted exactly once, when cancelling a paid booking.
    RequestRefund,
}

/// The outcome of planning: the next status and its side effects.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    pub next_status: BookingStatus,
    pub effects: Vec<TransitionEffect>,
}

impl TransitionPlan {
    /// Returns true if the plan carries a refund instruction.
    pub fn requests_refund(&self) -> bool {
        self.effects.contains(&TransitionEffect::RequestRefund)
    }
}

/// Facts about the persisted booking the planner needs beyond the two
/// status fields.
#[derive(Debug, Clone, Copy)]
pub struct BookingFacts {
    pub start_time_set: bool,
}

/// Plans a transition, or rejects it.
///
/// Rejections are `InvalidTransition` when the edge is not in the table,
/// `InvalidState` when a payment-coupling precondition fails, and a
/// validation error when required context is missing.
pub fn plan(
    status: BookingStatus,
    payment_status: PaymentStatus,
    trigger: Trigger,
    context: &TransitionContext,
    facts: BookingFacts,
) -> Result<TransitionPlan, DomainError> {
    let target = trigger.target_status();
    if !status.can_transition_to(&target) {
        return Err(DomainError::invalid_transition(status, target));
    }

    let effects = match trigger {
        Trigger::Confirm => {
            if payment_status.blocks_progress() {
                return Err(DomainError::new(
                    ErrorCode::InvalidState,
                    "Cannot confirm a booking whose payment has failed",
                ));
            }
            vec![]
        }
        Trigger::Reject => vec![],
        Trigger::Assign => {
            let provider_id = context
                .provider_id
                .ok_or_else(|| ValidationError::empty_field("provider_id"))?;
            vec![TransitionEffect::AssignProvider(provider_id)]
        }
        Trigger::Start => vec![TransitionEffect::SetStartTime(context.now)],
        Trigger::Complete => {
            if !facts.start_time_set {
                return Err(DomainError::new(
                    ErrorCode::InvalidState,
                    "Cannot complete a booking that was never started",
                ));
            }
            if payment_status.blocks_progress() {
                return Err(DomainError::new(
                    ErrorCode::InvalidState,
                    "Cannot complete a booking whose payment has failed",
                ));
            }
            vec![TransitionEffect::SetEndTime(context.now)]
        }
        Trigger::Cancel => {
            let cancellation = context
                .cancellation
                .clone()
                .ok_or_else(|| ValidationError::empty_field("cancellation_reason"))?;
            if cancellation.reason.trim().is_empty() {
                return Err(ValidationError::empty_field("cancellation_reason").into());
            }
            let mut effects = vec![TransitionEffect::RecordCancellation(cancellation)];
            if payment_status.requires_refund_on_cancel() {
                effects.push(TransitionEffect::RequestRefund);
            }
            effects
        }
    };

    Ok(TransitionPlan {
        next_status: target,
        effects,
    })
}
