//! Production wiring against local fixture upstreams: TMDB resolution, a JSON
//! API provider, a broken provider and an embed page mirror.

use std::collections::HashMap;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use flotilla_core::FlotillaConfig;
use flotilla_search::{FailureKind, MediaKind, ProviderSelection, ProviderStatus, StreamService};
use serde_json::json;

async fn find(
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if params.get("external_source").map(String::as_str) != Some("imdb_id") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    match id.as_str() {
        "tt0133093" => Json(json!({"movie_results": [{"id": 603}], "tv_results": []})),
        "tt0944947" => Json(json!({"movie_results": [], "tv_results": [{"id": 1399}]})),
        _ => Json(json!({"movie_results": [], "tv_results": []})),
    }
    .into_response()
}

async fn api_movie(Path(id): Path<String>) -> impl IntoResponse {
    if id != "603" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(json!({
        "page": 1,
        "streams": [{"title": "The Matrix 1080p WEB", "url": "http://cdn.test/matrix-1080.mp4", "size": 2048}]
    }))
    .into_response()
}

async fn embed_episode(Path((_id, season, episode)): Path<(String, u32, u32)>) -> String {
    format!(
        r#"<script>var sources = ["https:\/\/cdn.test\/hls\/got_s{season}e{episode}_720p.m3u8"];</script>"#
    )
}

async fn spawn_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let app = Router::new()
        .route("/tmdb/find/{id}", get(find))
        .route("/api/movie/{id}", get(api_movie))
        .route("/broken/movie/{id}", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/domains", get(|State(base): State<String>| async move { base }))
        .route("/embed/tv/{id}/{season}/{episode}", get(embed_episode))
        .with_state(base.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    base
}

fn production_config(base: &str) -> FlotillaConfig {
    let vars = HashMap::from([
        ("FLOTILLA_MODE", "production".to_string()),
        ("FLOTILLA_TMDB_API_KEY", "key".to_string()),
        ("FLOTILLA_TMDB_BASE_URL", format!("{base}/tmdb")),
        ("FLOTILLA_AGGREGATION_DEADLINE_MS", "5000".to_string()),
        (
            "FLOTILLA_JSON_PROVIDERS",
            format!("api|{base}/api/movie/{{id}}||/streams;broken|{base}/broken/movie/{{id}}|"),
        ),
        (
            "FLOTILLA_EMBED_PROVIDERS",
            format!("mirror|{base}/domains|/embed/movie/{{id}}|/embed/tv/{{id}}/{{season}}/{{episode}}"),
        ),
    ]);
    FlotillaConfig::from_lookup(|key| vars.get(key).cloned())
}

#[tokio::test]
async fn test_film_across_production_providers() {
    let base = spawn_upstream().await;
    let service = StreamService::from_config(&production_config(&base)).unwrap();
    assert_eq!(service.registry().names(), vec!["api", "broken", "mirror"]);

    let outcome = service.streams(MediaKind::Film, "tt0133093", None).await.unwrap();

    assert_eq!(outcome.candidates.len(), 1);
    let candidate = &outcome.candidates[0];
    assert_eq!(candidate.display_name, "api");
    assert_eq!(candidate.quality.as_deref(), Some("1080p"));
    assert_eq!(candidate.size_bytes, Some(2048));

    assert_eq!(outcome.provider_status["api"], ProviderStatus::Succeeded { count: 1 });
    assert_eq!(
        outcome.provider_status["broken"],
        ProviderStatus::Failed {
            kind: FailureKind::Failure,
            error_summary: "Upstream returned HTTP 500".to_string(),
        }
    );
    // The mirror has no page for this film.
    assert_eq!(outcome.provider_status["mirror"], ProviderStatus::Succeeded { count: 0 });
}

#[tokio::test]
async fn test_series_episode_from_embed_mirror() {
    let base = spawn_upstream().await;
    let service = StreamService::from_config(&production_config(&base)).unwrap();
    let selection = ProviderSelection::parse("mirror");

    let outcome = service
        .streams(MediaKind::Series, "tt0944947:2:7", Some(&selection))
        .await
        .unwrap();

    assert_eq!(outcome.provider_status.len(), 1);
    assert_eq!(outcome.candidates.len(), 1);
    let candidate = &outcome.candidates[0];
    assert_eq!(candidate.url, "https://cdn.test/hls/got_s2e7_720p.m3u8");
    assert_eq!(candidate.quality.as_deref(), Some("720p"));
    assert_eq!(
        candidate
            .request_headers
            .as_ref()
            .and_then(|headers| headers.get("Referer"))
            .cloned(),
        Some(format!("{base}/"))
    );
}

#[tokio::test]
async fn test_unknown_imdb_id_returns_nothing() {
    let base = spawn_upstream().await;
    let service = StreamService::from_config(&production_config(&base)).unwrap();

    let outcome = service.streams(MediaKind::Film, "tt0000001", None).await.unwrap();

    assert!(outcome.candidates.is_empty());
    assert!(outcome.provider_status.is_empty());
}
