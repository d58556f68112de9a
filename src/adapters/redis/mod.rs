//! Redis-backed cache and event publishing adapters.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::booking::BookingEvent;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{Cache, EventPublisher};

fn cache_error(e: redis::RedisError) -> DomainError {
    DomainError::new(ErrorCode::CacheError, format!("Redis operation failed: {}", e))
}

/// Redis-backed cache for hot booking reads.
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    /// Creates a new RedisCache.
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(cache_error)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), DomainError> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(cache_error)
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(cache_error)
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").finish_non_exhaustive()
    }
}

/// Publishes booking events on Redis pub/sub channels.
///
/// Channel names are the event names (`booking.created`, ...), with
/// JSON payloads. Publishing is fire-and-forget for subscribers; a
/// channel with no listeners is not an error.
#[derive(Clone)]
pub struct RedisEventPublisher {
    conn: MultiplexedConnection,
}

impl RedisEventPublisher {
    /// Creates a new RedisEventPublisher.
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, event: BookingEvent) -> Result<(), DomainError> {
        let payload = serde_json::to_string(&event).map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Failed to serialize event: {}", e),
            )
        })?;
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(event.name(), payload)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::CacheError,
                    format!("Failed to publish event: {}", e),
                )
            })
    }
}

impl std::fmt::Debug for RedisEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisEventPublisher").finish_non_exhaustive()
    }
}
