//! Persistence contract for the Booking aggregate.

use async_trait::async_trait;

use crate::domain::booking::{Booking, BookingCode};
use crate::domain::foundation::{BookingId, DomainError, ExternalId};

/// Detail key marking a conflict as a booking-code uniqueness violation,
/// so the create workflow can distinguish it from a version conflict and
/// regenerate the code.
pub const CODE_CONSTRAINT_DETAIL: &str = "constraint";

/// Returns true if the error is a booking-code uniqueness collision.
pub fn is_code_collision(err: &DomainError) -> bool {
    err.is_conflict()
        && err
            .details
            .get(CODE_CONSTRAINT_DETAIL)
            .map(|c| c == "booking_code")
            .unwrap_or(false)
}

/// Transactional store for bookings.
///
/// Bookings are never deleted; the contract deliberately has no delete
/// operation. All writes for one operation commit atomically.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Finds a booking by its internal id.
    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, DomainError>;

    /// Finds a booking by its external id.
    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<Booking>, DomainError>;

    /// Persists a new booking, returning it with the assigned internal id.
    ///
    /// A booking-code uniqueness violation surfaces as a Conflict error
    /// marked with [`CODE_CONSTRAINT_DETAIL`] = `booking_code`.
    async fn insert(&self, booking: &Booking) -> Result<Booking, DomainError>;

    /// Updates a booking only if its stored version still equals
    /// `expected_version`; the stored version is incremented on success.
    ///
    /// Returns Conflict if the row changed since the caller's read, so two
    /// concurrent transitions can never both succeed silently.
    async fn update_conditional(
        &self,
        booking: &Booking,
        expected_version: i32,
    ) -> Result<Booking, DomainError>;

    /// Checks whether a booking code is already taken.
    async fn booking_code_exists(&self, code: &BookingCode) -> Result<bool, DomainError>;
}
