//! Booking lifecycle status and cancellation attribution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a booking.
///
/// Happy path: pending -> confirmed -> assigned -> ongoing -> completed.
/// Cancelled and rejected are side exits; completed, cancelled, and
/// rejected are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Assigned,
    Ongoing,
    Completed,
    Cancelled,
    Rejected,
}

impl BookingStatus {
    /// Returns all valid target states from this status.
    pub fn valid_transitions(&self) -> Vec<BookingStatus> {
        use BookingStatus::*;
        match self {
            Pending => vec![Confirmed, Rejected, Cancelled],
            Confirmed => vec![Assigned, Cancelled],
            Assigned => vec![Ongoing, Cancelled],
            Ongoing => vec![Completed],
            Completed | Cancelled | Rejected => vec![],
        }
    }

    /// Returns true if a transition from this status to target is in the table.
    pub fn can_transition_to(&self, target: &BookingStatus) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Returns true if no further transitions are permitted.
    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// Returns true if a booking in this status may have no provider yet.
    pub fn allows_missing_provider(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Assigned => "assigned",
            BookingStatus::Ongoing => "ongoing",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// Which actor cancelled a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    Customer,
    Provider,
    System,
    Admin,
}

impl fmt::Display for CancelledBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CancelledBy::Customer => "customer",
            CancelledBy::Provider => "provider",
            CancelledBy::System => "system",
            CancelledBy::Admin => "admin",
        };
        write!(f, "{}", s)
    }
}
