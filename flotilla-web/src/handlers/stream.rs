//! Stream resource handlers

use axum::Json;
use axum::extract::{Path, State};
use flotilla_search::{MediaKind, ProviderSelection};

use crate::addon_config::AddonConfig;
use crate::errors::WebError;
use crate::server::AppState;
use crate::stremio::{StreamsResponse, to_streams};

/// `GET /stream/{type}/{id}.json`
///
/// # Errors
/// - `WebError::InvalidRequest` - Unknown content type or malformed id
/// - `WebError::NotFound` - Resource path does not end in `.json`
pub async fn streams(
    State(state): State<AppState>,
    Path((media_type, id)): Path<(String, String)>,
) -> Result<Json<StreamsResponse>, WebError> {
    lookup_streams(&state, &media_type, &id, None).await
}

/// `GET /{config}/stream/{type}/{id}.json`
///
/// # Errors
/// - `WebError::InvalidRequest` - Unknown content type or malformed id
/// - `WebError::NotFound` - Resource path does not end in `.json`
pub async fn configured_streams(
    State(state): State<AppState>,
    Path((config, media_type, id)): Path<(String, String, String)>,
) -> Result<Json<StreamsResponse>, WebError> {
    let config = AddonConfig::parse(&config);
    lookup_streams(&state, &media_type, &id, config.selection.as_ref()).await
}

async fn lookup_streams(
    state: &AppState,
    media_type: &str,
    resource: &str,
    selection: Option<&ProviderSelection>,
) -> Result<Json<StreamsResponse>, WebError> {
    let raw_id = resource
        .strip_suffix(".json")
        .ok_or_else(|| WebError::NotFound {
            path: resource.to_string(),
        })?;
    let kind: MediaKind = media_type.parse()?;

    let outcome = state.service.streams(kind, raw_id, selection).await?;

    let failed = outcome.failed_providers().len();
    let streams = to_streams(outcome.candidates);
    tracing::info!(
        media_type,
        id = raw_id,
        streams = streams.len(),
        failed_providers = failed,
        "Served stream request"
    );

    Ok(Json(StreamsResponse { streams }))
}
