//! PostgreSQL implementation of BookingReader.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::booking::Booking;
use crate::domain::foundation::{DomainError, ErrorCode, ExternalId, UserId};
use crate::ports::BookingReader;

use super::{booking_from_row, BOOKING_COLUMNS};

/// PostgreSQL implementation of BookingReader.
#[derive(Clone)]
pub struct PostgresBookingReader {
    pool: PgPool,
}

impl PostgresBookingReader {
    /// Creates a new PostgresBookingReader.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_by(&self, column: &str, user_id: UserId) -> Result<Vec<Booking>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM bookings WHERE {} = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS, column
        ))
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to list bookings: {}", e))
        })?;

        rows.into_iter().map(booking_from_row).collect()
    }
}

#[async_trait]
impl BookingReader for PostgresBookingReader {
    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<Booking>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM bookings WHERE external_id = $1",
            BOOKING_COLUMNS
        ))
        .bind(external_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to fetch booking: {}", e))
        })?;

        row.map(booking_from_row).transpose()
    }

    async fn list_for_customer(&self, customer_id: UserId) -> Result<Vec<Booking>, DomainError> {
        self.list_by("customer_id", customer_id).await
    }

    async fn list_for_provider(&self, provider_id: UserId) -> Result<Vec<Booking>, DomainError> {
        self.list_by("provider_id", provider_id).await
    }
}
