//! Addon manifest handlers

use axum::Json;
use axum::extract::{Path, State};

use crate::addon_config::AddonConfig;
use crate::server::AppState;
use crate::stremio::Manifest;

/// `GET /manifest.json`
pub async fn manifest(State(state): State<AppState>) -> Json<Manifest> {
    Json(Manifest::new(&state.service.registry().names()))
}

/// `GET /{config}/manifest.json`, announcing only the selected providers.
pub async fn configured_manifest(
    State(state): State<AppState>,
    Path(config): Path<String>,
) -> Json<Manifest> {
    let config = AddonConfig::parse(&config);
    let names: Vec<String> = state
        .service
        .registry()
        .select(config.selection.as_ref())
        .iter()
        .map(|provider| provider.name().to_string())
        .collect();
    Json(Manifest::new(&names))
}
