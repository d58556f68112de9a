//! HTTP routes for booking endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    assign_booking, cancel_booking, complete_booking, confirm_booking, create_booking,
    get_booking, list_bookings, payment_webhook, rate_booking, reject_booking, start_booking,
    BookingHandlers,
};

/// Creates the booking router with all endpoints.
pub fn booking_routes(handlers: BookingHandlers) -> Router {
    Router::new()
        .route("/", post(create_booking))
        .route("/", get(list_bookings))
        .route("/:id", get(get_booking))
        .route("/:id/confirm", post(confirm_booking))
        .route("/:id/reject", post(reject_booking))
        .route("/:id/assign", post(assign_booking))
        .route("/:id/start", post(start_booking))
        .route("/:id/complete", post(complete_booking))
        .route("/:id/cancel", post(cancel_booking))
        .route("/:id/rating", post(rate_booking))
        .with_state(handlers)
}

/// Creates the webhook router, mounted outside the authenticated tree.
pub fn webhook_routes(handlers: BookingHandlers) -> Router {
    Router::new()
        .route("/payments", post(payment_webhook))
        .with_state(handlers)
}
