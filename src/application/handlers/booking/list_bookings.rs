//! ListBookingsHandler - per-user booking listings.

use std::sync::Arc;

use crate::domain::booking::{Booking, BookingStatus};
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::user::UserRole;
use crate::ports::BookingReader;

#[derive(Debug, Clone, Copy)]
pub struct ListBookingsQuery {
    pub requester_id: UserId,
    pub requester_role: UserRole,
    /// When set, list another user's bookings. Admin only.
    pub for_user: Option<UserId>,
    pub status: Option<BookingStatus>,
}

pub struct ListBookingsHandler {
    reader: Arc<dyn BookingReader>,
}

impl ListBookingsHandler {
    pub fn new(reader: Arc<dyn BookingReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(&self, query: ListBookingsQuery) -> Result<Vec<Booking>, DomainError> {
        if query.for_user.is_some() && query.requester_role != UserRole::Admin {
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "Only admins may list another user's bookings",
            ));
        }
        let subject = query.for_user.unwrap_or(query.requester_id);

        let mut bookings = match query.requester_role {
            UserRole::Provider => self.reader.list_for_provider(subject).await?,
            _ => self.reader.list_for_customer(subject).await?,
        };
        if let Some(status) = query.status {
            bookings.retain(|b| b.status == status);
        }
        Ok(bookings)
    }
}
