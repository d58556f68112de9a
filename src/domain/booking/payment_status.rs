//! Payment status tracking, evolving independently of the lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of payment for a booking.
///
/// Coupled to the lifecycle state machine in two places: a booking cannot
/// be confirmed or completed while payment has failed, and cancelling a
/// paid booking emits a refund instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
    Partial,
}

impl PaymentStatus {
    /// Returns true if lifecycle progress (confirm, complete) is blocked.
    pub fn blocks_progress(&self) -> bool {
        matches!(self, PaymentStatus::Failed)
    }

    /// Returns true if cancelling now requires a refund instruction.
    pub fn requires_refund_on_cancel(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Partial => "partial",
        };
        write!(f, "{}", s)
    }
}
