//! Providers are invoked concurrently, and the optional deadline bounds the wait.

use std::sync::Arc;
use std::time::{Duration, Instant};

use flotilla_search::providers::StubProvider;
use flotilla_search::{Aggregator, Candidate, FailureKind, MediaReference, ProviderStatus, SourceProvider};

fn delayed(name: &str, millis: u64) -> Arc<dyn SourceProvider> {
    Arc::new(
        StubProvider::returning(name, vec![Candidate::new(name, format!("http://{name}.test/1"))])
            .with_delay(Duration::from_millis(millis)),
    )
}

#[tokio::test]
async fn test_wall_clock_tracks_slowest_provider() {
    let providers: Vec<Arc<dyn SourceProvider>> = [50, 10, 30, 5, 40]
        .into_iter()
        .enumerate()
        .map(|(i, millis)| delayed(&format!("p{i}"), millis))
        .collect();
    let media = MediaReference::film("tt0133093").with_internal_id("603");

    let started = Instant::now();
    let outcome = Aggregator::new().aggregate(&media, &providers).await;
    let elapsed = started.elapsed();

    assert_eq!(outcome.candidates.len(), 5);
    assert!(
        elapsed < Duration::from_millis(100),
        "aggregation took {elapsed:?}; providers were not invoked concurrently"
    );
}

#[tokio::test]
async fn test_deadline_bounds_a_hanging_provider() {
    let providers: Vec<Arc<dyn SourceProvider>> = vec![
        delayed("quick", 5),
        Arc::new(StubProvider::hanging("stuck")),
    ];
    let media = MediaReference::film("tt0133093").with_internal_id("603");

    let started = Instant::now();
    let outcome = Aggregator::with_deadline(Some(Duration::from_millis(150)))
        .aggregate(&media, &providers)
        .await;
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_secs(2), "deadline ignored: {elapsed:?}");
    assert_eq!(outcome.provider_status["quick"], ProviderStatus::Succeeded { count: 1 });
    assert_eq!(
        outcome.provider_status["stuck"],
        ProviderStatus::Failed {
            kind: FailureKind::Timeout,
            error_summary: "timeout".to_string(),
        }
    );
}
