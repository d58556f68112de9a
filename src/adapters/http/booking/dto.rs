//! HTTP DTOs for booking endpoints.
//!
//! Monetary fields cross the wire as fixed-point decimal strings, never
//! floats. Response bodies expose the external id only; internal ids stay
//! inside the service.

use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::booking::{Booking, BookingStatus, PaymentStatus};
use crate::domain::foundation::{DomainError, ErrorCode};

// ============================================================================
// Request DTOs
// ============================================================================

/// Request to create a booking.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub service_id: i64,
    pub address_id: i64,
    pub schedule_date: NaiveDate,
    pub schedule_time: String,
    #[serde(default)]
    pub preferred_time: Option<String>,
    pub base_price: String,
    #[serde(default)]
    pub addons_total: Option<String>,
    #[serde(default)]
    pub discount_amount: Option<String>,
    #[serde(default)]
    pub tax_amount: Option<String>,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

/// Request to assign a provider.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignProviderRequest {
    pub provider_id: i64,
}

/// Request to cancel a booking.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: String,
    #[serde(default)]
    pub cancellation_charge: Option<String>,
}

/// Request to rate a completed booking.
#[derive(Debug, Clone, Deserialize)]
pub struct RateBookingRequest {
    pub rating: u8,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// Query parameters for listing bookings.
#[derive(Debug, Clone, Deserialize)]
pub struct ListBookingsParams {
    /// Admin only: list on behalf of another user.
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub status: Option<BookingStatus>,
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Full booking view for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub booking_code: String,
    pub customer_id: i64,
    pub service_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<i64>,
    pub address_id: i64,
    pub schedule_date: NaiveDate,
    pub schedule_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_time: Option<String>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub base_price: String,
    pub addons_total: String,
    pub discount_amount: String,
    pub tax_amount: String,
    pub total_amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<String>,
    pub cancellation_charge: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_feedback: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.external_id.to_string(),
            booking_code: booking.booking_code.as_str().to_string(),
            customer_id: booking.customer_id.value(),
            service_id: booking.service_id.value(),
            provider_id: booking.provider_id.map(|p| p.value()),
            address_id: booking.address_id.value(),
            schedule_date: booking.schedule_date,
            schedule_time: booking.schedule_time.as_str().to_string(),
            preferred_time: booking.preferred_time,
            status: booking.status,
            payment_status: booking.payment_status,
            base_price: booking.base_price.to_string(),
            addons_total: booking.addons_total.to_string(),
            discount_amount: booking.discount_amount.to_string(),
            tax_amount: booking.tax_amount.to_string(),
            total_amount: booking.total_amount.to_string(),
            payment_method: booking.payment_method,
            special_instructions: booking.special_instructions,
            cancellation_reason: booking.cancellation_reason,
            cancelled_by: booking.cancelled_by.map(|b| b.to_string()),
            cancellation_charge: booking.cancellation_charge.to_string(),
            start_time: booking.start_time.map(|t| t.to_string()),
            end_time: booking.end_time.map(|t| t.to_string()),
            provider_rating: booking.provider_rating.map(|r| r.value()),
            provider_feedback: booking.provider_feedback,
            customer_rating: booking.customer_rating.map(|r| r.value()),
            customer_feedback: booking.customer_feedback,
            created_at: booking.created_at.to_string(),
            updated_at: booking.updated_at.to_string(),
        }
    }
}

/// List wrapper for booking collections.
#[derive(Debug, Clone, Serialize)]
pub struct BookingListResponse {
    pub bookings: Vec<BookingResponse>,
    pub total: usize,
}

/// Error body shared by all booking endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "VALIDATION_FAILED".to_string(),
            message: message.into(),
        }
    }
}

/// Maps a domain error to the HTTP status and wire body.
pub fn map_domain_error(err: &DomainError) -> (StatusCode, ErrorResponse) {
    let status = match err.code {
        ErrorCode::ValidationFailed
        | ErrorCode::InvalidAmount
        | ErrorCode::InvalidRating
        | ErrorCode::InvalidSchedule => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::BookingNotFound
        | ErrorCode::UserNotFound
        | ErrorCode::ServiceNotFound
        | ErrorCode::AddressNotFound => StatusCode::NOT_FOUND,
        ErrorCode::InvalidTransition
        | ErrorCode::InvalidState
        | ErrorCode::AlreadySet
        | ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Unauthorized | ErrorCode::InvalidWebhookSignature => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::PaymentGatewayError => StatusCode::BAD_GATEWAY,
        ErrorCode::DatabaseError | ErrorCode::CacheError | ErrorCode::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        ErrorResponse {
            code: err.code.to_string(),
            message: err.message.clone(),
        },
    )
}
