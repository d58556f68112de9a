//! Service entry point: configuration, connections, router, serve loop.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use service_booking::adapters::http::{app_router, AuthState, BookingHandlers};
use service_booking::adapters::http::middleware::JwtVerifier;
use service_booking::adapters::payment::HttpPaymentGateway;
use service_booking::adapters::postgres::{
    PostgresBookingReader, PostgresBookingRepository, PostgresReferenceChecker,
};
use service_booking::adapters::redis::{RedisCache, RedisEventPublisher};
use service_booking::application::handlers::booking::{
    CreateBookingHandler, GetBookingHandler, HandlePaymentWebhookHandler, ListBookingsHandler,
    RecordRatingHandler, TransitionBookingHandler,
};
use service_booking::config::AppConfig;
use service_booking::ports::{
    BookingReader, BookingRepository, Cache, EventPublisher, PaymentGateway, ReferenceChecker,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    if config.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    tracing::info!(
        environment = ?config.server.environment,
        "starting service-booking"
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let redis_client = redis::Client::open(config.redis.url.as_str())?;
    let redis_conn = redis_client.get_multiplexed_tokio_connection().await?;

    // Ports
    let repository: Arc<dyn BookingRepository> =
        Arc::new(PostgresBookingRepository::new(pool.clone()));
    let reader: Arc<dyn BookingReader> = Arc::new(PostgresBookingReader::new(pool.clone()));
    let references: Arc<dyn ReferenceChecker> =
        Arc::new(PostgresReferenceChecker::new(pool.clone()));
    let cache: Arc<dyn Cache> = Arc::new(RedisCache::new(redis_conn.clone()));
    let events: Arc<dyn EventPublisher> = Arc::new(RedisEventPublisher::new(redis_conn));
    let payment_gateway: Arc<dyn PaymentGateway> = Arc::new(HttpPaymentGateway::new(
        service_booking::adapters::payment::PaymentGatewayConfig {
            base_url: config.payment.base_url.clone(),
            api_key: config.payment.api_key.clone(),
            webhook_secret: config.payment.webhook_secret.clone(),
        },
    ));

    // Application handlers
    let handlers = BookingHandlers::new(
        Arc::new(CreateBookingHandler::new(
            repository.clone(),
            references.clone(),
            events.clone(),
        )),
        Arc::new(TransitionBookingHandler::new(
            repository.clone(),
            references,
            payment_gateway.clone(),
            events.clone(),
        )),
        Arc::new(RecordRatingHandler::new(repository.clone(), events.clone())),
        Arc::new(GetBookingHandler::new(reader.clone(), cache.clone())),
        Arc::new(ListBookingsHandler::new(reader)),
        Arc::new(HandlePaymentWebhookHandler::new(
            repository,
            payment_gateway,
            events,
        )),
        cache,
    );

    let auth: AuthState = Arc::new(JwtVerifier::new(config.auth.jwt_secret.clone()));
    let app = app_router(handlers, auth, pool, config.server.request_timeout());

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
