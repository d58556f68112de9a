//! PostgreSQL persistence adapters.

mod booking_reader;
mod booking_repository;
mod reference_checker;

pub use booking_reader::PostgresBookingReader;
pub use booking_repository::PostgresBookingRepository;
pub use reference_checker::PostgresReferenceChecker;

use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::booking::{
    Booking, BookingCode, BookingStatus, CancelledBy, PaymentStatus, TimeSlot,
};
use crate::domain::foundation::{
    AddressId, BookingId, DomainError, ErrorCode, ExternalId, Money, Rating, ServiceId, Timestamp,
    UserId,
};

/// Column list shared by every booking SELECT and RETURNING clause.
pub(crate) const BOOKING_COLUMNS: &str = "id, external_id, booking_code, customer_id, \
    service_id, provider_id, address_id, schedule_date, schedule_time, preferred_time, \
    status, payment_status, base_price, addons_total, discount_amount, tax_amount, \
    total_amount, payment_method, payment_id, special_instructions, cancellation_reason, \
    cancelled_by, cancellation_charge, start_time, end_time, provider_rating, \
    provider_feedback, customer_rating, customer_feedback, created_at, updated_at, version";

pub(crate) fn bind_money(money: Money) -> i64 {
    money.minor_units()
}

fn money_column(row: &PgRow, column: &str) -> Result<Money, DomainError> {
    let minor: i64 = row.get(column);
    Money::from_minor_units(minor).map_err(|e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid stored amount in '{}': {}", column, e),
        )
    })
}

fn rating_column(row: &PgRow, column: &str) -> Result<Option<Rating>, DomainError> {
    let value: Option<i16> = row.get(column);
    value
        .map(|v| {
            Rating::new(v as u8).map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid stored rating in '{}': {}", column, e),
                )
            })
        })
        .transpose()
}

/// Reconstructs a Booking aggregate from a bookings row.
pub(crate) fn booking_from_row(row: PgRow) -> Result<Booking, DomainError> {
    let id: i64 = row.get("id");
    let external_id: Uuid = row.get("external_id");
    let booking_code: String = row.get("booking_code");
    let customer_id: i64 = row.get("customer_id");
    let service_id: i64 = row.get("service_id");
    let provider_id: Option<i64> = row.get("provider_id");
    let address_id: i64 = row.get("address_id");
    let schedule_date: NaiveDate = row.get("schedule_date");
    let schedule_time: String = row.get("schedule_time");
    let status: String = row.get("status");
    let payment_status: String = row.get("payment_status");
    let cancelled_by: Option<String> = row.get("cancelled_by");
    let start_time: Option<chrono::DateTime<chrono::Utc>> = row.get("start_time");
    let end_time: Option<chrono::DateTime<chrono::Utc>> = row.get("end_time");
    let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
    let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");

    Ok(Booking {
        id: Some(BookingId::new(id)),
        external_id: ExternalId::from_uuid(external_id),
        booking_code: BookingCode::parse(booking_code).map_err(stored_value_error)?,
        customer_id: UserId::new(customer_id),
        service_id: ServiceId::new(service_id),
        provider_id: provider_id.map(UserId::new),
        address_id: AddressId::new(address_id),
        schedule_date,
        schedule_time: TimeSlot::parse(schedule_time).map_err(stored_value_error)?,
        preferred_time: row.get("preferred_time"),
        status: str_to_status(&status)?,
        payment_status: str_to_payment_status(&payment_status)?,
        base_price: money_column(&row, "base_price")?,
        addons_total: money_column(&row, "addons_total")?,
        discount_amount: money_column(&row, "discount_amount")?,
        tax_amount: money_column(&row, "tax_amount")?,
        total_amount: money_column(&row, "total_amount")?,
        payment_method: row.get("payment_method"),
        payment_id: row.get("payment_id"),
        special_instructions: row.get("special_instructions"),
        cancellation_reason: row.get("cancellation_reason"),
        cancelled_by: cancelled_by.map(|s| str_to_cancelled_by(&s)).transpose()?,
        cancellation_charge: money_column(&row, "cancellation_charge")?,
        start_time: start_time.map(Timestamp::from_datetime),
        end_time: end_time.map(Timestamp::from_datetime),
        provider_rating: rating_column(&row, "provider_rating")?,
        provider_feedback: row.get("provider_feedback"),
        customer_rating: rating_column(&row, "customer_rating")?,
        customer_feedback: row.get("customer_feedback"),
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
        version: row.get("version"),
    })
}

fn stored_value_error(err: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid stored booking field: {}", err),
    )
}

// ============================================================================
// Type conversions
// ============================================================================

pub(crate) fn status_to_str(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Pending => "pending",
        BookingStatus::Confirmed => "confirmed",
        BookingStatus::Assigned => "assigned",
        BookingStatus::Ongoing => "ongoing",
        BookingStatus::Completed => "completed",
        BookingStatus::Cancelled => "cancelled",
        BookingStatus::Rejected => "rejected",
    }
}

pub(crate) fn str_to_status(s: &str) -> Result<BookingStatus, DomainError> {
    match s {
        "pending" => Ok(BookingStatus::Pending),
        "confirmed" => Ok(BookingStatus::Confirmed),
        "assigned" => Ok(BookingStatus::Assigned),
        "ongoing" => Ok(BookingStatus::Ongoing),
        "completed" => Ok(BookingStatus::Completed),
        "cancelled" => Ok(BookingStatus::Cancelled),
        "rejected" => Ok(BookingStatus::Rejected),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid booking status: {}", s),
        )),
    }
}

pub(crate) fn payment_status_to_str(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "pending",
        PaymentStatus::Paid => "paid",
        PaymentStatus::Failed => "failed",
        PaymentStatus::Refunded => "refunded",
        PaymentStatus::Partial => "partial",
    }
}

pub(crate) fn str_to_payment_status(s: &str) -> Result<PaymentStatus, DomainError> {
    match s {
        "pending" => Ok(PaymentStatus::Pending),
        "paid" => Ok(PaymentStatus::Paid),
        "failed" => Ok(PaymentStatus::Failed),
        "refunded" => Ok(PaymentStatus::Refunded),
        "partial" => Ok(PaymentStatus::Partial),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid payment status: {}", s),
        )),
    }
}

pub(crate) fn cancelled_by_to_str(by: CancelledBy) -> &'static str {
    match by {
        CancelledBy::Customer => "customer",
        CancelledBy::Provider => "provider",
        CancelledBy::System => "system",
        CancelledBy::Admin => "admin",
    }
}

pub(crate) fn str_to_cancelled_by(s: &str) -> Result<CancelledBy, DomainError> {
    match s {
        "customer" => Ok(CancelledBy::Customer),
        "provider" => Ok(CancelledBy::Provider),
        "system" => Ok(CancelledBy::System),
        "admin" => Ok(CancelledBy::Admin),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid cancelled_by value: {}", s),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_status_round_trips() {
        let statuses = [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Assigned,
            BookingStatus::Ongoing,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::Rejected,
        ];
        for status in statuses {
            assert_eq!(str_to_status(status_to_str(status)).unwrap(), status);
        }
    }

    #[test]
    fn payment_status_round_trips() {
        let statuses = [
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
            PaymentStatus::Partial,
        ];
        for status in statuses {
            assert_eq!(
                str_to_payment_status(payment_status_to_str(status)).unwrap(),
                status
            );
        }
    }

    #[test]
    fn cancelled_by_round_trips() {
        let values = [
            CancelledBy::Customer,
            CancelledBy::Provider,
            CancelledBy::System,
            CancelledBy::Admin,
        ];
        for value in values {
            assert_eq!(
                str_to_cancelled_by(cancelled_by_to_str(value)).unwrap(),
                value
            );
        }
    }

    #[test]
    fn invalid_status_strings_are_rejected() {
        assert!(str_to_status("archived").is_err());
        assert!(str_to_payment_status("unpaid").is_err());
        assert!(str_to_cancelled_by("nobody").is_err());
    }
}
