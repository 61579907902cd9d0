//! The canonical three-provider scenario, through the aggregator and the service.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use flotilla_search::providers::StubProvider;
use flotilla_search::{
    Aggregator, Candidate, FailureKind, MediaKind, MediaReference, ProviderError,
    ProviderRegistry, ProviderStatus, SourceProvider, StaticResolver, StreamService,
};
use parking_lot::Mutex;

fn scenario_providers() -> Vec<StubProvider> {
    vec![
        StubProvider::returning(
            "A",
            vec![Candidate::new("X", "http://a/1").with_quality("1080p")],
        ),
        StubProvider::failing("B", "timeout"),
        StubProvider::returning("C", Vec::new()),
    ]
}

fn expected_status() -> BTreeMap<String, ProviderStatus> {
    BTreeMap::from([
        ("A".to_string(), ProviderStatus::Succeeded { count: 1 }),
        (
            "B".to_string(),
            ProviderStatus::Failed {
                kind: FailureKind::Failure,
                error_summary: "timeout".to_string(),
            },
        ),
        ("C".to_string(), ProviderStatus::Succeeded { count: 0 }),
    ])
}

#[tokio::test]
async fn test_three_provider_scenario() {
    let media = MediaReference::film("tmdb:603").with_internal_id("603");
    let providers: Vec<Arc<dyn SourceProvider>> = scenario_providers()
        .into_iter()
        .map(|stub| Arc::new(stub) as Arc<dyn SourceProvider>)
        .collect();

    let outcome = Aggregator::new().aggregate(&media, &providers).await;

    assert_eq!(
        outcome.candidates,
        vec![Candidate::new("X", "http://a/1").with_quality("1080p")]
    );
    assert_eq!(outcome.provider_status, expected_status());
}

#[tokio::test]
async fn test_scenario_through_stream_service() {
    let mut registry = ProviderRegistry::new();
    for stub in scenario_providers() {
        registry.register(Arc::new(stub)).unwrap();
    }
    let service = StreamService::new(registry, Arc::new(StaticResolver::demo()), Aggregator::new());

    let outcome = service.streams(MediaKind::Film, "tt0133093", None).await.unwrap();

    assert_eq!(outcome.candidates.len(), 1);
    assert_eq!(outcome.provider_status, expected_status());
}

#[tokio::test]
async fn test_resolution_miss_short_circuits() {
    let stubs = scenario_providers();
    let counters: Vec<_> = stubs.iter().map(StubProvider::invocation_counter).collect();

    let mut registry = ProviderRegistry::new();
    for stub in stubs {
        registry.register(Arc::new(stub)).unwrap();
    }
    let service = StreamService::new(registry, Arc::new(StaticResolver::new()), Aggregator::new());

    let outcome = service.streams(MediaKind::Series, "tt0944947:1:1", None).await.unwrap();

    assert!(outcome.candidates.is_empty());
    assert!(outcome.provider_status.is_empty());
    assert!(counters.iter().all(|counter| counter.load(Ordering::SeqCst) == 0));
}

/// Records the media every invocation receives.
#[derive(Debug, Default)]
struct RecordingProvider {
    seen: Mutex<Vec<MediaReference>>,
}

#[async_trait]
impl SourceProvider for RecordingProvider {
    fn name(&self) -> &str {
        "recorder"
    }

    async fn invoke(&self, media: &MediaReference) -> Result<Vec<Candidate>, ProviderError> {
        self.seen.lock().push(media.clone());
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(vec![Candidate::new(
            media.to_string(),
            format!("http://recorder.test/{}", media.lookup_id()),
        )])
    }
}

#[tokio::test]
async fn test_overlapping_requests_get_their_own_media() {
    let recorder = Arc::new(RecordingProvider::default());
    let mut registry = ProviderRegistry::new();
    registry
        .register(Arc::clone(&recorder) as Arc<dyn SourceProvider>)
        .unwrap();
    let service = StreamService::new(registry, Arc::new(StaticResolver::demo()), Aggregator::new());

    let requests = [
        (MediaKind::Film, "tt0133093"),
        (MediaKind::Series, "tt0944947"),
        (MediaKind::Series, "tmdb:1396:3:4"),
    ];
    let outcomes = join_all(
        requests
            .iter()
            .map(|(kind, id)| service.streams(*kind, id, None)),
    )
    .await;

    let urls: Vec<String> = outcomes
        .into_iter()
        .map(|outcome| outcome.unwrap().candidates[0].url.clone())
        .collect();
    assert_eq!(
        urls,
        vec![
            "http://recorder.test/603",
            "http://recorder.test/1399",
            "http://recorder.test/1396",
        ]
    );

    let seen = recorder.seen.lock().clone();
    assert_eq!(seen.len(), 3);
    let defaulted = seen
        .iter()
        .find(|media| media.external_id == "tt0944947")
        .unwrap();
    assert_eq!((defaulted.season, defaulted.episode), (Some(1), Some(1)));
}
