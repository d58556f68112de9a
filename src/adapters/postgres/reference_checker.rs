//! PostgreSQL implementation of ReferenceChecker.
//!
//! Users are soft-deleted, so every user query filters `deleted_at IS NULL`
//! explicitly.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::foundation::{
    AddressId, DomainError, ErrorCode, ExternalId, ServiceId, Timestamp, UserId,
};
use crate::domain::user::{User, UserRole};
use crate::ports::ReferenceChecker;

/// PostgreSQL implementation of ReferenceChecker.
#[derive(Clone)]
pub struct PostgresReferenceChecker {
    pool: PgPool,
}

impl PostgresReferenceChecker {
    /// Creates a new PostgresReferenceChecker.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceChecker for PostgresReferenceChecker {
    async fn find_live_user(&self, id: UserId) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, external_id, name, email, role, is_active,
                   deleted_at, created_at, updated_at
            FROM users
            WHERE id = $1 AND is_active = TRUE AND deleted_at IS NULL
            "#,
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to fetch user: {}", e))
        })?;

        row.map(user_from_row).transpose()
    }

    async fn service_is_active(&self, id: ServiceId) -> Result<bool, DomainError> {
        let result: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM services WHERE id = $1 AND is_active = TRUE")
                .bind(id.value())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to check service: {}", e),
                    )
                })?;

        Ok(result.0 > 0)
    }

    async fn address_owner(&self, id: AddressId) -> Result<Option<UserId>, DomainError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM addresses WHERE id = $1")
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Failed to fetch address: {}", e),
                )
            })?;

        Ok(row.map(|(user_id,)| UserId::new(user_id)))
    }
}

fn user_from_row(row: sqlx::postgres::PgRow) -> Result<User, DomainError> {
    let external_id: Uuid = row.get("external_id");
    let role: String = row.get("role");
    let deleted_at: Option<chrono::DateTime<chrono::Utc>> = row.get("deleted_at");
    let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
    let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");

    Ok(User {
        id: UserId::new(row.get("id")),
        external_id: ExternalId::from_uuid(external_id),
        name: row.get("name"),
        email: row.get("email"),
        role: UserRole::parse(&role).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid stored user role: {}", role),
            )
        })?,
        is_active: row.get("is_active"),
        deleted_at: deleted_at.map(Timestamp::from_datetime),
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
    })
}
