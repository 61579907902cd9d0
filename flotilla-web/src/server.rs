//! Addon server: shared state, routes and the serve loop.

use std::time::Instant;

use axum::Router;
use axum::routing::get;
use chrono::{DateTime, Utc};
use flotilla_core::{FlotillaConfig, FlotillaError};
use flotilla_search::StreamService;
use tower_http::cors::CorsLayer;

use crate::handlers::{
    aggregate_outcome, configured_manifest, configured_streams, health, manifest, streams,
};

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Stream lookup service
    pub service: StreamService,
    /// When the server started, for uptime
    pub server_started_at: Instant,
    /// Wall-clock start time reported by the health endpoint
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wraps a service, starting the uptime clock now.
    pub fn new(service: StreamService) -> Self {
        Self {
            service,
            server_started_at: Instant::now(),
            started_at: Utc::now(),
        }
    }
}

/// Builds the addon router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Stremio addon protocol
        .route("/manifest.json", get(manifest))
        .route("/{config}/manifest.json", get(configured_manifest))
        .route("/stream/{media_type}/{id}", get(streams))
        .route("/{config}/stream/{media_type}/{id}", get(configured_streams))
        // Operator endpoints
        .route("/api/aggregate/{media_type}/{id}", get(aggregate_outcome))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs the addon server until the process is stopped.
///
/// # Errors
/// - `FlotillaError::HttpClient` - Outbound HTTP client could not be built
/// - `FlotillaError::Configuration` - Provider declarations are inconsistent
/// - `FlotillaError::Io` - Listener could not be bound or serving failed
pub async fn run_server(config: FlotillaConfig) -> Result<(), FlotillaError> {
    let service = StreamService::from_config(&config)?;
    let app = router(AppState::new(service));

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        %address,
        mode = %config.runtime_mode,
        "Flotilla addon listening; install from http://{address}/manifest.json"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
