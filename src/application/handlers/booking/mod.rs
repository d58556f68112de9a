//! Booking command and query handlers.

mod create_booking;
mod get_booking;
mod handle_payment_webhook;
mod list_bookings;
mod record_rating;
mod transition_booking;

pub use create_booking::{CreateBookingCommand, CreateBookingHandler};
pub use get_booking::{invalidate_cached_booking, GetBookingHandler, GetBookingQuery};
pub use handle_payment_webhook::{HandlePaymentWebhookCommand, HandlePaymentWebhookHandler};
pub use list_bookings::{ListBookingsHandler, ListBookingsQuery};
pub use record_rating::{RecordRatingCommand, RecordRatingHandler};
pub use transition_booking::{Actor, TransitionBookingCommand, TransitionBookingHandler};

#[cfg(test)]
pub(crate) mod test_support;
