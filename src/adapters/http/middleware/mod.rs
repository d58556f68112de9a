//! HTTP middleware for the REST API.

mod auth;

pub use auth::{
    auth_middleware, AuthRejection, AuthState, AuthenticatedUser, JwtVerifier, RequireAuth,
};
