//! CreateBookingHandler - customer-initiated booking creation.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::domain::booking::{Booking, BookingEvent, NewBooking, TimeSlot, MAX_CODE_ATTEMPTS};
use crate::domain::foundation::{
    AddressId, DomainError, ErrorCode, Money, ServiceId, Timestamp, UserId,
};
use crate::ports::{is_code_collision, BookingRepository, EventPublisher, ReferenceChecker};

/// Command to create a booking.
///
/// `customer_id` comes from the authenticated request context, never the
/// request body.
#[derive(Debug, Clone)]
pub struct CreateBookingCommand {
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

/// Handler for creating bookings.
pub struct CreateBookingHandler {
    repository: Arc<dyn BookingRepository>,
    references: Arc<dyn ReferenceChecker>,
    events: Arc<dyn EventPublisher>,
}

impl CreateBookingHandler {
    pub fn new(
        repository: Arc<dyn BookingRepository>,
        references: Arc<dyn ReferenceChecker>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            references,
            events,
        }
    }

    pub async fn handle(&self, cmd: CreateBookingCommand) -> Result<Booking, DomainError> {
        // Referenced entities must exist before anything is persisted.
        self.references
            .find_live_user(cmd.customer_id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::UserNotFound, "Customer not found"))?;

        if !self.references.service_is_active(cmd.service_id).await? {
            return Err(DomainError::new(
                ErrorCode::ServiceNotFound,
                "Service not found or not bookable",
            ));
        }

        let owner = self.references.address_owner(cmd.address_id).await?;
        if owner != Some(cmd.customer_id) {
            return Err(DomainError::new(
                ErrorCode::AddressNotFound,
                "Address not found for this customer",
            ));
        }

        let now = Timestamp::now();
        let mut booking = Booking::create(
            NewBooking {
                customer_id: cmd.customer_id,
                service_id: cmd.service_id,
                address_id: cmd.address_id,
                schedule_date: cmd.schedule_date,
                schedule_time: cmd.schedule_time,
                preferred_time: cmd.preferred_time,
                base_price: cmd.base_price,
                addons_total: cmd.addons_total,
                discount_amount: cmd.discount_amount,
                tax_amount: cmd.tax_amount,
                special_instructions: cmd.special_instructions,
            },
            now,
        )?;

        // The DB uniqueness constraint is the authority on booking codes;
        // regenerate and retry on collision, up to the bound.
        let mut attempt = 1;
        let persisted = loop {
            match self.repository.insert(&booking).await {
                Ok(persisted) => break persisted,
                Err(err) if is_code_collision(&err) && attempt < MAX_CODE_ATTEMPTS => {
                    tracing::warn!(
                        code = %booking.booking_code,
                        attempt,
                        "booking code collision, regenerating"
                    );
                    booking.regenerate_code(Timestamp::now())?;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        };

        let event = BookingEvent::Created {
            external_id: persisted.external_id,
            booking_code: persisted.booking_code.as_str().to_string(),
            customer_id: persisted.customer_id,
            total_amount: persisted.total_amount,
            occurred_at: now,
        };
        if let Err(err) = self.events.publish(event).await {
            tracing::warn!(error = %err, "failed to publish booking.created event");
        }

        tracing::info!(
            booking = %persisted.external_id,
            code = %persisted.booking_code,
            "booking created"
        );
        Ok(persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::booking::test_support::{
        FakeReferences, InMemoryBookingRepository, RecordingEventPublisher,
    };
    use crate::domain::booking::{BookingStatus, PaymentStatus};
    use crate::domain::user::UserRole;

    fn command() -> CreateBookingCommand {
        CreateBookingCommand {
            customer_id: UserId::new(1),
            service_id: ServiceId::new(2),
            address_id: AddressId::new(3),
            schedule_date: Timestamp::now().add_days(3).date(),
            schedule_time: TimeSlot::parse("09:00-10:00").unwrap(),
            preferred_time: None,
            base_price: Money::parse("base_price", "2999.00").unwrap(),
            addons_total: Money::ZERO,
            discount_amount: Money::ZERO,
            tax_amount: Money::ZERO,
            special_instructions: None,
        }
    }

    fn references() -> Arc<FakeReferences> {
        Arc::new(
            FakeReferences::new()
                .with_user(UserId::new(1), UserRole::Customer)
                .with_service(ServiceId::new(2))
                .with_address(AddressId::new(3), UserId::new(1)),
        )
    }

    fn handler(
        repo: Arc<InMemoryBookingRepository>,
        refs: Arc<FakeReferences>,
        events: Arc<RecordingEventPublisher>,
    ) -> CreateBookingHandler {
        CreateBookingHandler::new(repo, refs, events)
    }

    #[tokio::test]
    async fn creates_pending_booking_with_derived_total() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let handler = handler(repo.clone(), references(), events.clone());

        let booking = handler.handle(command()).await.unwrap();

        assert!(booking.id.is_some());
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
        assert_eq!(booking.total_amount.to_string(), "2999.00");
        assert_eq!(events.published().len(), 1);
        assert_eq!(repo.insert_count(), 1);
    }

    #[tokio::test]
    async fn rejects_unknown_customer() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        let refs = Arc::new(FakeReferences::new().with_service(ServiceId::new(2)));
        let handler = handler(repo.clone(), refs, Arc::new(RecordingEventPublisher::new()));

        let err = handler.handle(command()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UserNotFound);
        assert_eq!(repo.insert_count(), 0);
    }

    #[tokio::test]
    async fn rejects_inactive_service() {
        let refs = Arc::new(
            FakeReferences::new()
                .with_user(UserId::new(1), UserRole::Customer)
                .with_address(AddressId::new(3), UserId::new(1)),
        );
        let handler = handler(
            Arc::new(InMemoryBookingRepository::new()),
            refs,
            Arc::new(RecordingEventPublisher::new()),
        );

        let err = handler.handle(command()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ServiceNotFound);
    }

    #[tokio::test]
    async fn rejects_address_owned_by_someone_else() {
        let refs = Arc::new(
            FakeReferences::new()
                .with_user(UserId::new(1), UserRole::Customer)
                .with_service(ServiceId::new(2))
                .with_address(AddressId::new(3), UserId::new(99)),
        );
        let handler = handler(
            Arc::new(InMemoryBookingRepository::new()),
            refs,
            Arc::new(RecordingEventPublisher::new()),
        );

        let err = handler.handle(command()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AddressNotFound);
    }

    #[tokio::test]
    async fn retries_code_collision_then_succeeds() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        repo.fail_next_inserts_with_code_collision(2);
        let handler = handler(
            repo.clone(),
            references(),
            Arc::new(RecordingEventPublisher::new()),
        );

        let booking = handler.handle(command()).await.unwrap();
        assert!(booking.id.is_some());
    }

    #[tokio::test]
    async fn surfaces_conflict_after_exhausting_code_retries() {
        let repo = Arc::new(InMemoryBookingRepository::new());
        repo.fail_next_inserts_with_code_collision(MAX_CODE_ATTEMPTS as i64);
        let handler = handler(
            repo.clone(),
            references(),
            Arc::new(RecordingEventPublisher::new()),
        );

        let err = handler.handle(command()).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(repo.insert_count(), 0);
    }
}
