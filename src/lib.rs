//! Event Studio backend: public content API and admin CMS for an event
//! management marketing site.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod logging;
pub mod media;
pub mod notify;
pub mod routes;
pub mod state;
pub mod validation;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware, Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::db::Store;
use crate::logging::LogConfig;
use crate::state::AppState;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// CORS for the configured frontend origins; unparsable entries are skipped.
pub fn configure_cors(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Build the full application router around `state`.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(&state.config.allowed_origins);

    routes::api_router(state.clone())
        .merge(routes::health_router())
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

async fn connect_store(config: &AppConfig) -> Result<Store, BoxError> {
    let Some(db_config) = &config.database else {
        if config.is_production() {
            return Err("DATABASE_URL must be set in production".into());
        }
        tracing::warn!("DATABASE_URL not set; content is kept in memory and lost on restart");
        return Ok(Store::memory());
    };

    tracing::info!(url = %db_config.redacted_url(), "connecting to database");
    let pool = db::init_pool(db_config).await?;
    db::schema::run_migrations(&pool).await?;
    Ok(Store::Postgres(pool))
}

fn spawn_session_purge(store: Store) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            match store.purge_expired_sessions().await {
                Ok(0) => {}
                Ok(purged) => tracing::info!(purged, "expired sessions removed"),
                Err(e) => tracing::warn!(error = %e, "session purge failed"),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

/// Load configuration, connect the store and serve until interrupted.
pub async fn run() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();

    let _log_guards = logging::init(&LogConfig::from_env());
    routes::health::init_start_time();

    let config = AppConfig::from_env();
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| format!("invalid HOST/PORT: {}", e))?;

    let store = connect_store(&config).await?;
    let state = AppState::new(store, config);
    routes::auth::bootstrap_admin(&state).await?;
    spawn_session_purge(state.store.clone());

    tracing::info!(
        environment = %state.config.environment,
        backend = state.store.backend(),
        media = state.media.is_some(),
        "starting server on {}",
        addr
    );

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server stopped");
    Ok(())
}
