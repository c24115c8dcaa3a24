//! Aegis Server
//!
//! Backend for the Aegis threat dashboard.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        AEGIS SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌─────────────────────────┐ │
//! │  │  Session  │  │  Data &   │  │  Event Fabricator       │ │
//! │  │  Gate     │  │  Assistant│  │  /functions/v1/...      │ │
//! │  │  (pages)  │  │  API      │  │                         │ │
//! │  └─────┬─────┘  └─────┬─────┘  └────────────┬────────────┘ │
//! │        └──────────────┼──────────────────────┘              │
//! │                       ▼                                     │
//! │                ┌─────────────┐                             │
//! │                │ PostgreSQL  │                             │
//! │                └─────────────┘                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod models;
mod handlers;
mod middleware;
mod error;
mod fabricator;
mod gate;
mod assistant;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post, options},
    middleware as axum_middleware,
    http::{header, HeaderName, HeaderValue},
};
use tower_http::{
    cors::{CorsLayer, Any},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::net::SocketAddr;

pub use error::{AppError, AppResult};
use gate::AppRoute;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    init_logging();

    let config = config::Config::from_env().context("Invalid configuration")?;

    tracing::info!("Aegis server starting ({})", config.environment);
    tracing::info!("Database: {}", config.redacted_database_url());

    // Initialize database pool
    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    let state = AppState {
        pool,
        config: config.clone(),
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_logging() {
    let json = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "aegis_server=debug,tower_http=debug".into()))
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    // Public API routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/session/navigate", get(handlers::pages::navigate));

    // Dashboard data routes (user JWT auth)
    let data_routes = Router::new()
        .route("/api/threats/live", get(handlers::threats::live))
        .route("/api/v1/threats", get(handlers::threats::list))
        .route("/api/v1/stats", get(handlers::threats::stats))
        .route("/api/v1/honeypot", get(handlers::threats::honeypot))
        .route("/api/assistant/analyze-threat", post(handlers::assistant::analyze_threat))
        .route("/api/user/progress", get(handlers::progress::get).post(handlers::progress::record))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_user_auth
        ));

    // Pages go through the session gate; unknown paths fall back to it too
    let page_routes = [
        AppRoute::Login,
        AppRoute::ResetPassword,
    ]
    .into_iter()
    .chain(AppRoute::SHELL_PAGES)
    .filter_map(|route| route.path())
    .fold(Router::new(), |router, path| {
        router.route(path, get(handlers::pages::render))
    });

    let api = Router::new()
        .merge(public_routes)
        .merge(data_routes)
        .merge(page_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        );

    Router::new()
        .merge(api)
        .merge(fabricator_routes(state.clone()))
        .fallback(handlers::pages::render)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fabricator endpoint with the fixed cross-origin headers on every response
fn fabricator_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            handlers::fabricator::PATH,
            options(handlers::fabricator::preflight).fallback(handlers::fabricator::generate),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::auth::require_invoker
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("access-control-allow-headers"),
            HeaderValue::from_static(handlers::fabricator::ALLOW_HEADERS),
        ))
}
