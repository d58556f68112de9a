//! HTTP adapters - REST API implementations.

pub mod booking;
pub mod middleware;

use std::time::Duration;

use axum::{http::StatusCode, middleware::from_fn_with_state, routing::get, Json, Router};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use booking::{booking_routes, webhook_routes, BookingHandlers};
pub use middleware::{auth_middleware, AuthState};

/// Assembles the full application router.
///
/// Booking routes sit behind the auth middleware; webhooks and health
/// do not (webhook requests authenticate with their HMAC signature).
pub fn app_router(
    handlers: BookingHandlers,
    auth: AuthState,
    pool: PgPool,
    request_timeout: Duration,
) -> Router {
    Router::new()
        .nest(
            "/api/bookings",
            booking_routes(handlers.clone())
                .layer(from_fn_with_state(auth, auth_middleware)),
        )
        .nest("/api/webhooks", webhook_routes(handlers))
        .route("/health", get(health).with_state(pool))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(CorsLayer::permissive()),
        )
}

/// GET /health - liveness and database reachability.
async fn health(
    axum::extract::State(pool): axum::extract::State<PgPool>,
) -> (StatusCode, Json<serde_json::Value>) {
    match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ok",
                "service": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "database": "up",
            })),
        ),
        Err(e) => {
            tracing::error!(error = %e, "health check database probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "degraded",
                    "service": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                    "database": "down",
                })),
            )
        }
    }
}
