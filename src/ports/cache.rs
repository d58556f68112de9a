//! Key-value cache port with expiry.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

/// Key-value store with per-entry expiry, used to front hot reads.
///
/// The cache is advisory: callers must treat misses and errors
/// identically and fall back to the source of truth.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), DomainError>;

    async fn delete(&self, key: &str) -> Result<(), DomainError>;
}
