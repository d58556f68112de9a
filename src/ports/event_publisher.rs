//! Port for publishing booking domain events.

use async_trait::async_trait;

use crate::domain::booking::BookingEvent;
use crate::domain::foundation::DomainError;

/// Publishes domain events for downstream consumers (notifications,
/// analytics). Delivery is best-effort; publishing failures must not roll
/// back the booking mutation that produced the event.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: BookingEvent) -> Result<(), DomainError>;
}
