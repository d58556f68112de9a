//! JWT authentication middleware and extractors.
//!
//! The middleware validates Bearer tokens and injects `AuthenticatedUser`
//! into request extensions; handlers opt in to enforcement with the
//! `RequireAuth` extractor. Missing tokens pass through so public routes
//! (health, payment webhooks) share the same router.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserId;
use crate::domain::user::UserRole;

/// Claims carried in access tokens issued by the identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Internal user id.
    pub sub: i64,
    pub role: String,
    pub exp: i64,
}

/// The user a request acts as, resolved from its access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub role: UserRole,
}

/// Decodes and validates HS256 access tokens.
#[derive(Clone)]
pub struct JwtVerifier {
    secret: Secret<String>,
}

impl JwtVerifier {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    /// Validates a token and resolves the user it identifies.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, jsonwebtoken::errors::Error> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let data = decode::<Claims>(token, &key, &Validation::default())?;
        let role = UserRole::parse(&data.claims.role).ok_or_else(|| {
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidToken)
        })?;
        Ok(AuthenticatedUser {
            id: UserId::new(data.claims.sub),
            role,
        })
    }
}

/// Auth middleware state.
pub type AuthState = Arc<JwtVerifier>;

/// Validates Bearer tokens and injects the user into request extensions.
///
/// A missing token passes through unauthenticated; an invalid one is
/// rejected here with 401.
pub async fn auth_middleware(
    State(verifier): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match token {
        Some(token) => match verifier.verify(token) {
            Ok(user) => {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
            Err(e) => {
                tracing::debug!(error = %e, "token validation failed");
                (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({
                        "code": "UNAUTHORIZED",
                        "message": "Invalid or expired token"
                    })),
                )
                    .into_response()
            }
        },
        None => next.run(request).await,
    }
}

/// Extractor that requires an authenticated user.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedUser);

impl<S> axum::extract::FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .copied()
                .map(RequireAuth)
                .ok_or(AuthRejection::Unauthenticated)
        })
    }
}

/// Rejection for requests without a valid token.
#[derive(Debug, Clone)]
pub enum AuthRejection {
    Unauthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "code": "UNAUTHORIZED",
                "message": "Authentication required"
            })),
        )
            .into_response()
    }
}
