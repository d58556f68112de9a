//! User entity and roles.
//!
//! Users are externally authenticated; this module carries only what the
//! booking core needs: role checks and soft-delete awareness. Users use
//! soft delete (`deleted_at`), and every read query must exclude deleted
//! rows explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{ExternalId, Timestamp, UserId};

/// Role of a platform user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Customer,
    Provider,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserRole::Customer => "customer",
            UserRole::Provider => "provider",
            UserRole::Admin => "admin",
        };
        write!(f, "{}", s)
    }
}

impl UserRole {
    /// Parses a stored role string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(UserRole::Customer),
            "provider" => Some(UserRole::Provider),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// A platform user as seen by the booking core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub external_id: ExternalId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Returns true if the user is soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns true if the user can participate in bookings.
    pub fn is_live(&self) -> bool {
        self.is_active && !self.is_deleted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> User {
        User {
            id: UserId::new(1),
            external_id: ExternalId::new(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            role,
            is_active: true,
            deleted_at: None,
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        }
    }

    #[test]
    fn active_user_is_live() {
        assert!(user(UserRole::Customer).is_live());
    }

    #[test]
    fn soft_deleted_user_is_not_live() {
        let mut u = user(UserRole::Provider);
        u.deleted_at = Some(Timestamp::now());
        assert!(u.is_deleted());
        assert!(!u.is_live());
    }

    #[test]
    fn deactivated_user_is_not_live() {
        let mut u = user(UserRole::Customer);
        u.is_active = false;
        assert!(!u.is_live());
    }

    #[test]
    fn role_parses_and_displays_symmetrically() {
        for role in [UserRole::Customer, UserRole::Provider, UserRole::Admin] {
            assert_eq!(UserRole::parse(&role.to_string()), Some(role));
        }
        assert_eq!(UserRole::parse("superuser"), None);
    }
}
