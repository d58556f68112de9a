//! GetBookingHandler - single-booking read with a cache in front.

use std::sync::Arc;

use crate::domain::booking::Booking;
use crate::domain::foundation::{DomainError, ErrorCode, ExternalId, UserId};
use crate::domain::user::UserRole;
use crate::ports::{BookingReader, Cache};

const CACHE_TTL_SECS: u64 = 300;

fn cache_key(external_id: &ExternalId) -> String {
    format!("booking:{}", external_id)
}

#[derive(Debug, Clone, Copy)]
pub struct GetBookingQuery {
    pub external_id: ExternalId,
    pub requester_id: UserId,
    pub requester_role: UserRole,
}

pub struct GetBookingHandler {
    reader: Arc<dyn BookingReader>,
    cache: Arc<dyn Cache>,
}

impl GetBookingHandler {
    pub fn new(reader: Arc<dyn BookingReader>, cache: Arc<dyn Cache>) -> Self {
        Self { reader, cache }
    }

    pub async fn handle(&self, query: GetBookingQuery) -> Result<Booking, DomainError> {
        let booking = self.load(&query.external_id).await?.ok_or_else(|| {
            DomainError::new(ErrorCode::BookingNotFound, "Booking not found")
        })?;

        let visible = match query.requester_role {
            UserRole::Admin => true,
            UserRole::Customer => booking.customer_id == query.requester_id,
            UserRole::Provider => booking.provider_id == Some(query.requester_id),
        };
        if !visible {
            // Hide existence from strangers rather than answering 403.
            return Err(DomainError::new(
                ErrorCode::BookingNotFound,
                "Booking not found",
            ));
        }
        Ok(booking)
    }

    async fn load(&self, external_id: &ExternalId) -> Result<Option<Booking>, DomainError> {
        let key = cache_key(external_id);
        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Booking>(&raw) {
                Ok(booking) => return Ok(Some(booking)),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "discarding undecodable cache entry");
                    let _ = self.cache.delete(&key).await;
                }
            },
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "cache read failed, falling back");
            }
        }

        let booking = self.reader.find_by_external_id(external_id).await?;
        if let Some(booking) = &booking {
            match serde_json::to_string(booking) {
                Ok(raw) => {
                    if let Err(err) = self.cache.set(&key, &raw, CACHE_TTL_SECS).await {
                        tracing::warn!(key = %key, error = %err, "cache write failed");
                    }
                }
                Err(err) => tracing::warn!(error = %err, "failed to serialize booking for cache"),
            }
        }
        Ok(booking)
    }
}

/// Drops a booking's cache entry after a write.
pub async fn invalidate_cached_booking(cache: &dyn Cache, external_id: &ExternalId) {
    let key = cache_key(external_id);
    if let Err(err) = cache.delete(&key).await {
        tracing::warn!(key = %key, error = %err, "cache invalidation failed");
    }
}
