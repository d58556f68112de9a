//! PostgreSQL implementation of BookingRepository.
//!
//! Monetary columns are BIGINT minor units. The `version` column backs
//! optimistic concurrency, and the unique index on `booking_code` is the
//! final authority on code uniqueness.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::booking::{Booking, BookingCode};
use crate::domain::foundation::{BookingId, DomainError, ErrorCode, ExternalId};
use crate::ports::{BookingRepository, CODE_CONSTRAINT_DETAIL};

use super::{
    bind_money, booking_from_row, cancelled_by_to_str, payment_status_to_str, status_to_str,
    BOOKING_COLUMNS,
};

/// PostgreSQL implementation of BookingRepository.
#[derive(Clone)]
pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    /// Creates a new PostgresBookingRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to fetch booking: {}", e))
        })?;

        row.map(booking_from_row).transpose()
    }

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

    async fn insert(&self, booking: &Booking) -> Result<Booking, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO bookings (
                external_id, booking_code, customer_id, service_id, provider_id,
                address_id, schedule_date, schedule_time, preferred_time,
                status, payment_status,
                base_price, addons_total, discount_amount, tax_amount, total_amount,
                payment_method, payment_id, special_instructions,
                cancellation_reason, cancelled_by, cancellation_charge,
                start_time, end_time,
                provider_rating, provider_feedback, customer_rating, customer_feedback,
                created_at, updated_at, version
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28,
                $29, $30, $31
            )
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(booking.external_id.as_uuid())
        .bind(booking.booking_code.as_str())
        .bind(booking.customer_id.value())
        .bind(booking.service_id.value())
        .bind(booking.provider_id.map(|id| id.value()))
        .bind(booking.address_id.value())
        .bind(booking.schedule_date)
        .bind(booking.schedule_time.as_str())
        .bind(booking.preferred_time.as_deref())
        .bind(status_to_str(booking.status))
        .bind(payment_status_to_str(booking.payment_status))
        .bind(bind_money(booking.base_price))
        .bind(bind_money(booking.addons_total))
        .bind(bind_money(booking.discount_amount))
        .bind(bind_money(booking.tax_amount))
        .bind(bind_money(booking.total_amount))
        .bind(booking.payment_method.as_deref())
        .bind(booking.payment_id.as_deref())
        .bind(booking.special_instructions.as_deref())
        .bind(booking.cancellation_reason.as_deref())
        .bind(booking.cancelled_by.map(cancelled_by_to_str))
        .bind(bind_money(booking.cancellation_charge))
        .bind(booking.start_time.map(|t| *t.as_datetime()))
        .bind(booking.end_time.map(|t| *t.as_datetime()))
        .bind(booking.provider_rating.map(|r| r.value() as i16))
        .bind(booking.provider_feedback.as_deref())
        .bind(booking.customer_rating.map(|r| r.value() as i16))
        .bind(booking.customer_feedback.as_deref())
        .bind(booking.created_at.as_datetime())
        .bind(booking.updated_at.as_datetime())
        .bind(booking.version)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        booking_from_row(row)
    }

    async fn update_conditional(
        &self,
        booking: &Booking,
        expected_version: i32,
    ) -> Result<Booking, DomainError> {
        let id = booking.id.ok_or_else(|| {
            DomainError::new(
                ErrorCode::InvalidState,
                "Cannot update a booking that was never inserted",
            )
        })?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE bookings SET
                provider_id = $3,
                status = $4,
                payment_status = $5,
                payment_method = $6,
                payment_id = $7,
                cancellation_reason = $8,
                cancelled_by = $9,
                cancellation_charge = $10,
                start_time = $11,
                end_time = $12,
                provider_rating = $13,
                provider_feedback = $14,
                customer_rating = $15,
                customer_feedback = $16,
                updated_at = $17,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(id.value())
        .bind(expected_version)
        .bind(booking.provider_id.map(|p| p.value()))
        .bind(status_to_str(booking.status))
        .bind(payment_status_to_str(booking.payment_status))
        .bind(booking.payment_method.as_deref())
        .bind(booking.payment_id.as_deref())
        .bind(booking.cancellation_reason.as_deref())
        .bind(booking.cancelled_by.map(cancelled_by_to_str))
        .bind(bind_money(booking.cancellation_charge))
        .bind(booking.start_time.map(|t| *t.as_datetime()))
        .bind(booking.end_time.map(|t| *t.as_datetime()))
        .bind(booking.provider_rating.map(|r| r.value() as i16))
        .bind(booking.provider_feedback.as_deref())
        .bind(booking.customer_rating.map(|r| r.value() as i16))
        .bind(booking.customer_feedback.as_deref())
        .bind(booking.updated_at.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to update booking: {}", e))
        })?;

        match row {
            Some(row) => booking_from_row(row),
            None => {
                // Distinguish a lost version race from a missing row.
                let exists: (i64,) =
                    sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE id = $1")
                        .bind(id.value())
                        .fetch_one(&self.pool)
                        .await
                        .map_err(|e| {
                            DomainError::new(
                                ErrorCode::DatabaseError,
                                format!("Failed to check booking existence: {}", e),
                            )
                        })?;
                if exists.0 > 0 {
                    Err(DomainError::conflict(format!(
                        "Booking {} was modified concurrently",
                        booking.external_id
                    )))
                } else {
                    Err(DomainError::new(
                        ErrorCode::BookingNotFound,
                        format!("Booking not found: {}", booking.external_id),
                    ))
                }
            }
        }
    }

    async fn booking_code_exists(&self, code: &BookingCode) -> Result<bool, DomainError> {
        let result: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE booking_code = $1")
                .bind(code.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to check booking code: {}", e),
                    )
                })?;

        Ok(result.0 > 0)
    }
}

/// Maps insert failures, surfacing booking-code uniqueness violations as
/// marked conflicts so the create workflow can regenerate the code.
fn map_insert_error(err: sqlx::Error) -> DomainError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("");
            if constraint.contains("booking_code") {
                return DomainError::conflict("Duplicate booking code")
                    .with_detail(CODE_CONSTRAINT_DETAIL, "booking_code");
            }
            return DomainError::conflict(format!(
                "Unique constraint violated: {}",
                constraint
            ));
        }
    }
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Failed to insert booking: {}", err),
    )
}
