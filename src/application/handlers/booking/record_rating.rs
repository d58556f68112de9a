//! RecordRatingHandler - post-completion feedback from either side.

use std::sync::Arc;

use crate::domain::booking::{Booking, BookingEvent, RaterRole};
use crate::domain::foundation::{DomainError, ErrorCode, ExternalId, Rating, Timestamp, UserId};
use crate::domain::user::UserRole;
use crate::ports::{BookingRepository, EventPublisher};

#[derive(Debug, Clone)]
pub struct RecordRatingCommand {
    pub external_id: ExternalId,
    pub rater_id: UserId,
    pub rater_role: UserRole,
    pub rating: u8,
    pub feedback: Option<String>,
}

pub struct RecordRatingHandler {
    repository: Arc<dyn BookingRepository>,
    events: Arc<dyn EventPublisher>,
}

impl RecordRatingHandler {
    pub fn new(repository: Arc<dyn BookingRepository>, events: Arc<dyn EventPublisher>) -> Self {
        Self { repository, events }
    }

    pub async fn handle(&self, cmd: RecordRatingCommand) -> Result<Booking, DomainError> {
        let rating = Rating::new(cmd.rating)
            .map_err(|err| DomainError::new(ErrorCode::InvalidRating, err.to_string()))?;
        let mut booking = self
            .repository
            .find_by_external_id(&cmd.external_id)
            .await?
            .ok_or_else(|| DomainError::new(ErrorCode::BookingNotFound, "Booking not found"))?;

        let role = rater_role(&cmd, &booking)?;

        let now = Timestamp::now();
        let expected_version = booking.version;
        booking.record_rating(role, rating, cmd.feedback.clone(), now)?;
        let persisted = self
            .repository
            .update_conditional(&booking, expected_version)
            .await?;

        let event = BookingEvent::RatingRecorded {
            external_id: persisted.external_id,
            role,
            rating,
            occurred_at: now,
        };
        if let Err(err) = self.events.publish(event).await {
            tracing::warn!(error = %err, "failed to publish booking event");
        }

        tracing::info!(
            booking = %persisted.external_id,
            rater = ?role,
            rating = %rating,
            "rating recorded"
        );
        Ok(persisted)
    }
}

/// Only the booking's own customer or assigned provider may rate it.
fn rater_role(cmd: &RecordRatingCommand, booking: &Booking) -> Result<RaterRole, DomainError> {
    match cmd.rater_role {
        UserRole::Customer if booking.customer_id == cmd.rater_id => Ok(RaterRole::Customer),
        UserRole::Provider if booking.provider_id == Some(cmd.rater_id) => Ok(RaterRole::Provider),
        _ => Err(DomainError::new(
            ErrorCode::Forbidden,
            "Only the booking's customer or assigned provider may rate it",
        )),
    }
}
