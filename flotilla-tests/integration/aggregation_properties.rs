//! Settle-all properties of the aggregator over scripted providers.

use std::sync::Arc;

use flotilla_search::providers::StubProvider;
use flotilla_search::{
    AggregationOutcome, Aggregator, Candidate, FailureKind, MediaReference, ProviderStatus,
    SourceProvider,
};
use proptest::prelude::*;
use serde_json::{Value, json};

fn film() -> MediaReference {
    MediaReference::film("tt0133093").with_internal_id("603")
}

fn candidates_for(provider: &str, count: usize) -> Vec<Candidate> {
    (0..count)
        .map(|i| Candidate::new(format!("{provider} #{i}"), format!("http://{provider}.test/{i}")))
        .collect()
}

fn aggregate_blocking(providers: Vec<Arc<dyn SourceProvider>>) -> AggregationOutcome {
    tokio_test::block_on(Aggregator::new().aggregate(&film(), &providers))
}

#[tokio::test]
async fn test_single_failure_is_isolated() {
    let providers: Vec<Arc<dyn SourceProvider>> = vec![
        Arc::new(StubProvider::returning("a", candidates_for("a", 2))),
        Arc::new(StubProvider::failing("b", "connection refused")),
        Arc::new(StubProvider::returning("c", candidates_for("c", 1))),
    ];

    let outcome = Aggregator::new().aggregate(&film(), &providers).await;

    assert_eq!(outcome.candidates.len(), 3);
    assert!(outcome.candidates.iter().all(|c| !c.url.contains("b.test")));
    assert_eq!(
        outcome.provider_status["b"],
        ProviderStatus::Failed {
            kind: FailureKind::Failure,
            error_summary: "connection refused".to_string(),
        }
    );
    assert!(!outcome.all_failed());
}

#[tokio::test]
async fn test_total_failure_still_settles() {
    let providers: Vec<Arc<dyn SourceProvider>> = vec![
        Arc::new(StubProvider::failing("a", "dns failure")),
        Arc::new(StubProvider::panicking("b")),
        Arc::new(StubProvider::raw("c", Value::Null)),
    ];

    let outcome = Aggregator::new().aggregate(&film(), &providers).await;

    assert!(outcome.candidates.is_empty());
    assert_eq!(outcome.provider_status.len(), 3);
    assert!(outcome.all_failed());
}

#[tokio::test]
async fn test_empty_registry() {
    let outcome = Aggregator::new().aggregate(&film(), &[]).await;
    assert!(outcome.candidates.is_empty());
    assert!(outcome.provider_status.is_empty());
}

#[tokio::test]
async fn test_non_list_values_are_shape_errors() {
    let shapes = [
        ("null", Value::Null),
        ("object", json!({"url": "http://x.test/1"})),
        ("string", json!("http://x.test/1")),
        ("number", json!(42)),
        ("list-of-strings", json!(["http://x.test/1"])),
    ];
    let providers: Vec<Arc<dyn SourceProvider>> = shapes
        .into_iter()
        .map(|(name, value)| Arc::new(StubProvider::raw(name, value)) as Arc<dyn SourceProvider>)
        .chain(std::iter::once(
            Arc::new(StubProvider::returning("ok", candidates_for("ok", 1))) as Arc<dyn SourceProvider>,
        ))
        .collect();

    let outcome = Aggregator::new().aggregate(&film(), &providers).await;

    assert_eq!(outcome.candidates, candidates_for("ok", 1));
    for (name, status) in &outcome.provider_status {
        if name == "ok" {
            continue;
        }
        assert!(
            matches!(
                status,
                ProviderStatus::Failed {
                    kind: FailureKind::InvalidShape,
                    ..
                }
            ),
            "{name} should be a shape error, got {status:?}"
        );
    }
}

#[tokio::test]
async fn test_raw_list_is_coerced() {
    let providers: Vec<Arc<dyn SourceProvider>> = vec![Arc::new(StubProvider::raw(
        "raw",
        json!([
            {"name": "raw", "title": "Movie", "url": "http://raw.test/1.m3u8", "quality": "720p"},
            {"url": "http://raw.test/2.mp4", "size": 1024, "headers": {"Referer": "http://raw.test/"}}
        ]),
    ))];

    let outcome = Aggregator::new().aggregate(&film(), &providers).await;

    assert_eq!(outcome.provider_status["raw"], ProviderStatus::Succeeded { count: 2 });
    assert_eq!(outcome.candidates[0].display_name, "raw");
    assert_eq!(outcome.candidates[1].size_bytes, Some(1024));
    assert_eq!(
        outcome.candidates[1]
            .request_headers
            .as_ref()
            .and_then(|headers| headers.get("Referer"))
            .map(String::as_str),
        Some("http://raw.test/")
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_counts_match_contributions(counts in proptest::collection::vec(0usize..6, 1..6)) {
        let providers: Vec<Arc<dyn SourceProvider>> = counts
            .iter()
            .enumerate()
            .map(|(i, count)| {
                let name = format!("p{i}");
                let candidates = candidates_for(&name, *count);
                Arc::new(StubProvider::returning(name, candidates)) as Arc<dyn SourceProvider>
            })
            .collect();

        let outcome = aggregate_blocking(providers);

        prop_assert_eq!(outcome.candidates.len(), counts.iter().sum::<usize>());
        for (i, count) in counts.iter().enumerate() {
            let name = format!("p{i}");
            prop_assert_eq!(outcome.provider_status[&name].count(), *count);
            for candidate in candidates_for(&name, *count) {
                prop_assert!(outcome.candidates.contains(&candidate));
            }
        }
    }

    #[test]
    fn prop_failures_never_escape(failing in proptest::collection::vec(any::<bool>(), 1..8)) {
        let providers: Vec<Arc<dyn SourceProvider>> = failing
            .iter()
            .enumerate()
            .map(|(i, fails)| {
                let name = format!("p{i}");
                let provider = if *fails {
                    StubProvider::failing(name, "boom")
                } else {
                    StubProvider::returning(name.clone(), candidates_for(&name, 1))
                };
                Arc::new(provider) as Arc<dyn SourceProvider>
            })
            .collect();

        let outcome = aggregate_blocking(providers);

        let succeeding = failing.iter().filter(|fails| !**fails).count();
        prop_assert_eq!(outcome.candidates.len(), succeeding);
        prop_assert_eq!(outcome.provider_status.len(), failing.len());
        prop_assert_eq!(outcome.failed_providers().len(), failing.len() - succeeding);
    }
}
