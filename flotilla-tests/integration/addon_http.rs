//! The addon served over a real socket in development mode.

use flotilla_core::FlotillaConfig;
use flotilla_search::StreamService;
use flotilla_web::{AppState, router};
use serde_json::Value;

async fn spawn_addon() -> String {
    let service = StreamService::from_config(&FlotillaConfig::for_testing()).unwrap();
    let app = router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    base
}

async fn get_json(url: &str) -> (u16, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_install_and_stream_workflow() {
    let base = spawn_addon().await;

    let (status, manifest) = get_json(&format!("{base}/manifest.json")).await;
    assert_eq!(status, 200);
    assert_eq!(manifest["types"], serde_json::json!(["movie", "series"]));

    let (status, body) = get_json(&format!("{base}/stream/movie/tt0133093.json")).await;
    assert_eq!(status, 200);
    let streams = body["streams"].as_array().unwrap();
    assert!(!streams.is_empty());
    assert!(streams.iter().all(|stream| stream["url"].as_str().is_some()));
    assert!(streams[0]["name"].as_str().unwrap().contains("1080p"));
}

#[tokio::test]
async fn test_configured_addon_limits_providers() {
    let base = spawn_addon().await;

    let (status, outcome) =
        get_json(&format!("{base}/api/aggregate/series/tt0944947:1:3?providers=demo-harbor")).await;
    assert_eq!(status, 200);
    let statuses = outcome["provider_status"].as_object().unwrap();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses["demo-harbor"]["count"], 2);

    let (status, body) =
        get_json(&format!("{base}/providers=demo-shoal/stream/series/tt0944947:1:3.json")).await;
    assert_eq!(status, 200);
    assert_eq!(body["streams"], serde_json::json!([]));
}

#[tokio::test]
async fn test_failed_providers_visible_only_to_operators() {
    let base = spawn_addon().await;

    let (_, outcome) = get_json(&format!("{base}/api/aggregate/movie/tmdb:603")).await;
    assert_eq!(outcome["provider_status"]["demo-reef"]["state"], "failed");

    let (status, body) = get_json(&format!("{base}/stream/movie/tmdb:603.json")).await;
    assert_eq!(status, 200);
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_health_lists_demo_providers() {
    let base = spawn_addon().await;

    let (status, health) = get_json(&format!("{base}/health")).await;
    assert_eq!(status, 200);
    let providers = health["providers"].as_array().unwrap();
    assert!(providers.iter().any(|name| name == "demo-harbor"));
}
