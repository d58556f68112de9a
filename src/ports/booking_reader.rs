//! Read-side contract for booking listings.

use async_trait::async_trait;

use crate::domain::booking::Booking;
use crate::domain::foundation::{DomainError, ExternalId, UserId};

/// Query interface for bookings, separate from the write-side repository.
#[async_trait]
pub trait BookingReader: Send + Sync {
    /// Finds a booking by external id.
    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<Booking>, DomainError>;

    /// Lists a customer's bookings, most recent first.
    async fn list_for_customer(&self, customer_id: UserId) -> Result<Vec<Booking>, DomainError>;

    /// Lists a provider's assigned bookings, most recent first.
    async fn list_for_provider(&self, provider_id: UserId) -> Result<Vec<Booking>, DomainError>;
}
