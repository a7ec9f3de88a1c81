mod config;
mod db;
mod db_storage;
mod errors;
mod ficha;
mod handlers;
mod lead_capture;
mod models;
mod policy;
mod portfolio;

use axum::{
    routing::{get, post, put},
    Router,
};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - Database connection.
/// - Caches (share tokens, lead dedup).
/// - HTTP routes and middleware (CORS, Rate Limiting).
///
/// It then starts the Axum server.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if initialization fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fichapro_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Initialize database connection pool
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    // Share-token lookup cache (24 hour TTL); tokens are deterministic, so
    // eviction only costs a rescan of the record set
    let share_token_cache = Cache::builder()
        .time_to_live(Duration::from_secs(86400))
        .max_capacity(10_000)
        .build();
    tracing::info!("Share-token cache initialized");

    // Lead-submission dedup cache: double submits within the window are
    // acknowledged without creating a second lead
    let lead_dedup_cache = Cache::builder()
        .time_to_live(Duration::from_secs(config.lead_dedup_ttl_secs))
        .max_capacity(10_000)
        .build();
    tracing::info!(
        "Lead dedup cache initialized ({}s TTL)",
        config.lead_dedup_ttl_secs
    );

    // Build application state
    let app_state = Arc::new(crate::handlers::AppState {
        db: db.pool.clone(),
        config: config.clone(),
        share_token_cache,
        lead_dedup_cache,
    });

    // Configure rate limiter for the public surface: 10 requests/second per
    // IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Staff API consumed by the back-office SPA
    let staff_routes = Router::new()
        .route(
            "/api/v1/properties",
            get(handlers::list_properties).post(handlers::create_property),
        )
        .route(
            "/api/v1/properties/:id",
            get(handlers::get_property)
                .put(handlers::update_property)
                .delete(handlers::delete_property),
        )
        .route("/api/v1/properties/:id/share", post(ficha::create_share_link))
        .route("/api/v1/leads", get(handlers::list_leads))
        .route(
            "/api/v1/leads/:id",
            put(handlers::update_lead).delete(handlers::delete_lead),
        )
        .route(
            "/api/v1/negotiations",
            get(handlers::list_negotiations).post(handlers::create_negotiation),
        )
        .route(
            "/api/v1/negotiations/:id/stage",
            put(handlers::update_negotiation_stage),
        )
        .route("/api/v1/logs", get(handlers::list_logs))
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024));

    // Public ficha surface: rate limited and body limited, it faces the
    // open internet through the share links
    let public_routes = Router::new()
        .route("/public/ficha/:token", get(ficha::public_ficha))
        .route("/public/ficha/:token/leads", post(lead_capture::capture_lead))
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(64 * 1024))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(staff_routes)
        .merge(public_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
