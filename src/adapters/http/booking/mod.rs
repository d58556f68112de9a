//! HTTP adapter for booking endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    AssignProviderRequest, BookingListResponse, BookingResponse, CancelBookingRequest,
    CreateBookingRequest, ErrorResponse, ListBookingsParams, RateBookingRequest,
};
pub use handlers::BookingHandlers;
pub use routes::{booking_routes, webhook_routes};
