//! Operator endpoints: raw aggregation outcome and health

use axum::Json;
use axum::extract::{Path, Query, State};
use flotilla_search::{AggregationOutcome, MediaKind, ProviderSelection};
use serde::{Deserialize, Serialize};

use crate::errors::WebError;
use crate::server::AppState;

/// Optional provider filter for the operator view.
#[derive(Debug, Deserialize)]
pub struct AggregateQuery {
    /// Comma-separated provider names
    pub providers: Option<String>,
}

/// Health endpoint body.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthReport {
    /// Always `ok` while the server answers
    pub status: String,
    /// Seconds since the server started
    pub uptime_seconds: u64,
    /// Start time in RFC 3339
    pub started_at: String,
    /// Registered provider names
    pub providers: Vec<String>,
}

/// `GET /api/aggregate/{type}/{id}`: the full outcome including
/// per-provider status.
///
/// # Errors
/// - `WebError::InvalidRequest` - Unknown content type or malformed id
pub async fn aggregate_outcome(
    State(state): State<AppState>,
    Path((media_type, id)): Path<(String, String)>,
    Query(query): Query<AggregateQuery>,
) -> Result<Json<AggregationOutcome>, WebError> {
    let kind: MediaKind = media_type.parse()?;
    let raw_id = id.strip_suffix(".json").unwrap_or(&id);
    let selection = query.providers.as_deref().map(ProviderSelection::parse);

    let outcome = state
        .service
        .streams(kind, raw_id, selection.as_ref())
        .await?;
    Ok(Json(outcome))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok".to_string(),
        uptime_seconds: state.server_started_at.elapsed().as_secs(),
        started_at: state.started_at.to_rfc3339(),
        providers: state.service.registry().names(),
    })
}
