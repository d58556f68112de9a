//! Booking domain: aggregate, lifecycle state machine, and pricing.

mod aggregate;
mod code;
mod events;
mod payment_status;
mod schedule;
mod status;
mod transitions;

pub use aggregate::{Booking, NewBooking, PaymentOutcome, RaterRole};
pub use code::{BookingCode, MAX_CODE_ATTEMPTS};
pub use events::BookingEvent;
pub use payment_status::PaymentStatus;
pub use schedule::TimeSlot;
pub use status::{BookingStatus, CancelledBy};
pub use transitions::{
    plan, BookingFacts, CancellationRequest, TransitionContext, TransitionEffect, TransitionPlan,
    Trigger,
};
