//! Referential validation for entities owned outside the booking core.

use async_trait::async_trait;

use crate::domain::foundation::{AddressId, DomainError, ServiceId, UserId};
use crate::domain::user::User;

/// Existence checks against externally-owned entities.
///
/// Implementations must honor user soft delete: a soft-deleted or
/// deactivated user is never returned as live.
#[async_trait]
pub trait ReferenceChecker: Send + Sync {
    /// Finds a user that is active and not soft-deleted.
    async fn find_live_user(&self, id: UserId) -> Result<Option<User>, DomainError>;

    /// Returns true if the catalog service exists and is bookable.
    async fn service_is_active(&self, id: ServiceId) -> Result<bool, DomainError>;

    /// Returns the owning user of an address, if the address exists.
    async fn address_owner(&self, id: AddressId) -> Result<Option<UserId>, DomainError>;
}
