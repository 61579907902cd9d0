//! Concurrent fan-out over source providers with settle-all semantics.
//!
//! Every provider runs as its own task. The aggregator waits for all of them
//! to reach a terminal state (or for the optional deadline), then merges the
//! successful lists and records a status entry per provider. It never fails:
//! errors, panics, timeouts and malformed output only degrade the offending
//! provider's status.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::errors::ProviderError;
use crate::providers::SourceProvider;
use crate::types::{AggregationOutcome, Candidate, FailureKind, MediaReference, ProviderStatus};

/// Error summary recorded for providers still pending at the deadline.
pub const TIMEOUT_SUMMARY: &str = "timeout";
/// Error summary recorded for providers whose task panicked.
pub const PANIC_SUMMARY: &str = "provider panicked";

type Invocation = JoinHandle<Result<Vec<Candidate>, ProviderError>>;

/// Terminal state of one provider task.
#[derive(Debug)]
enum Settlement {
    Completed(Vec<Candidate>),
    Failed {
        kind: FailureKind,
        summary: String,
        detail: Option<String>,
    },
}

/// Scatter/gather over a list of providers.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    deadline: Option<Duration>,
}

impl Aggregator {
    /// Aggregator that waits for every provider to settle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregator that gives up on providers still pending after `deadline`.
    pub fn with_deadline(deadline: Option<Duration>) -> Self {
        Self { deadline }
    }

    /// Configured deadline, if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Invokes every provider concurrently and merges what they return.
    ///
    /// An empty provider list or an unresolved media reference yields an empty
    /// outcome without invoking anything.
    pub async fn aggregate(
        &self,
        media: &MediaReference,
        providers: &[Arc<dyn SourceProvider>],
    ) -> AggregationOutcome {
        if providers.is_empty() {
            return AggregationOutcome::empty();
        }

        if !media.is_resolved() {
            tracing::warn!(media = %media, "Refusing to aggregate an unresolved media reference");
            return AggregationOutcome::empty();
        }

        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "aggregate",
            %request_id,
            media = %media,
            providers = providers.len()
        );

        self.fan_out(Arc::new(media.clone().normalized()), providers)
            .instrument(span)
            .await
    }

    async fn fan_out(
        &self,
        media: Arc<MediaReference>,
        providers: &[Arc<dyn SourceProvider>],
    ) -> AggregationOutcome {
        let started_at = Instant::now();
        let deadline = self.deadline.map(|deadline| started_at + deadline);

        // Status is keyed by name, so only the first provider of a name runs.
        let mut seen = BTreeSet::new();
        let unique = providers.iter().filter(|provider| {
            let fresh = seen.insert(provider.name());
            if !fresh {
                tracing::warn!(provider = provider.name(), "Skipping provider with duplicate name");
            }
            fresh
        });

        // Dispatched: every task is spawned before any is awaited.
        let invocations: Vec<(String, Invocation)> = unique
            .map(|provider| {
                let name = provider.name().to_string();
                let provider = Arc::clone(provider);
                let media = Arc::clone(&media);
                let handle = tokio::spawn(
                    async move { provider.invoke(&media).await }.in_current_span(),
                );
                (name, handle)
            })
            .collect();

        // Settled: join every task, never short-circuiting.
        let settlements = futures::future::join_all(
            invocations
                .into_iter()
                .map(|(name, handle)| async move {
                    let settlement = settle(handle, deadline).await;
                    (name, settlement, started_at.elapsed())
                }),
        )
        .await;

        let mut outcome = AggregationOutcome::empty();
        for (name, settlement, elapsed) in settlements {
            let elapsed_ms = elapsed.as_millis() as u64;
            let status = match settlement.and_then_validate() {
                Settlement::Completed(candidates) => {
                    tracing::debug!(provider = %name, count = candidates.len(), elapsed_ms, "Provider settled");
                    let count = candidates.len();
                    outcome.candidates.extend(candidates);
                    ProviderStatus::Succeeded { count }
                }
                Settlement::Failed {
                    kind,
                    summary,
                    detail,
                } => {
                    tracing::warn!(
                        provider = %name,
                        ?kind,
                        error = %summary,
                        detail = detail.as_deref().unwrap_or(""),
                        elapsed_ms,
                        "Provider failed"
                    );
                    ProviderStatus::Failed {
                        kind,
                        error_summary: summary,
                    }
                }
            };
            outcome.provider_status.insert(name, status);
        }

        tracing::info!(
            candidates = outcome.candidates.len(),
            failed = outcome.failed_providers().len(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "Aggregation settled"
        );

        outcome
    }
}

/// Waits for one provider task, honoring the shared deadline.
async fn settle(mut handle: Invocation, deadline: Option<Instant>) -> Settlement {
    let joined = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                return Settlement::Failed {
                    kind: FailureKind::Timeout,
                    summary: TIMEOUT_SUMMARY.to_string(),
                    detail: None,
                };
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(Ok(candidates)) => Settlement::Completed(candidates),
        Ok(Err(error)) => {
            let detail = match &error {
                ProviderError::InvalidShape { detail } => Some(detail.clone()),
                _ => None,
            };
            Settlement::Failed {
                kind: error.failure_kind(),
                summary: error.to_string(),
                detail,
            }
        }
        Err(join_error) => Settlement::Failed {
            kind: FailureKind::Failure,
            summary: PANIC_SUMMARY.to_string(),
            detail: Some(join_error.to_string()),
        },
    }
}

impl Settlement {
    /// Rejects a completed list that contains any malformed candidate.
    fn and_then_validate(self) -> Self {
        let Settlement::Completed(candidates) = self else {
            return self;
        };

        match candidates.iter().find_map(|candidate| candidate.validate().err()) {
            Some(detail) => Settlement::Failed {
                kind: FailureKind::InvalidShape,
                summary: ProviderError::InvalidShape {
                    detail: detail.clone(),
                }
                .to_string(),
                detail: Some(detail),
            },
            None => Settlement::Completed(candidates),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::providers::StubProvider;

    fn resolved_film() -> MediaReference {
        MediaReference::film("tt0133093").with_internal_id("603")
    }

    fn arc(provider: StubProvider) -> Arc<dyn SourceProvider> {
        Arc::new(provider)
    }

    #[tokio::test]
    async fn test_empty_provider_list() {
        let outcome = Aggregator::new().aggregate(&resolved_film(), &[]).await;
        assert!(outcome.candidates.is_empty());
        assert!(outcome.provider_status.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_names_keep_first_provider() {
        let first = StubProvider::returning(
            "dup",
            vec![Candidate::new("A", "http://a/1"), Candidate::new("B", "http://a/2")],
        );
        let second = StubProvider::failing("dup", "boom");
        let second_calls = second.invocation_counter();

        let outcome = Aggregator::new()
            .aggregate(&resolved_film(), &[arc(first), arc(second)])
            .await;

        assert_eq!(outcome.candidates.len(), 2);
        assert_eq!(outcome.provider_status.len(), 1);
        assert_eq!(outcome.provider_status["dup"], ProviderStatus::Succeeded { count: 2 });
        assert_eq!(second_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unresolved_media_invokes_nothing() {
        let stub = StubProvider::returning("a", vec![Candidate::new("X", "http://a/1")]);
        let counter = stub.invocation_counter();

        let outcome = Aggregator::new()
            .aggregate(&MediaReference::film("tt0133093"), &[arc(stub)])
            .await;

        assert!(outcome.candidates.is_empty());
        assert!(outcome.provider_status.is_empty());
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let providers = vec![
            arc(StubProvider::returning("a", vec![Candidate::new("A", "http://a/1")])),
            arc(StubProvider::failing("b", "connection reset")),
            arc(StubProvider::returning("c", vec![Candidate::new("C", "http://c/1")])),
        ];

        let outcome = Aggregator::new().aggregate(&resolved_film(), &providers).await;

        assert_eq!(outcome.candidates.len(), 2);
        assert_eq!(
            outcome.provider_status["b"],
            ProviderStatus::Failed {
                kind: FailureKind::Failure,
                error_summary: "connection reset".to_string(),
            }
        );
        assert_eq!(outcome.provider_status["a"], ProviderStatus::Succeeded { count: 1 });
    }

    #[tokio::test]
    async fn test_panicking_provider_is_recorded_as_failure() {
        let providers = vec![
            arc(StubProvider::panicking("boom")),
            arc(StubProvider::returning("ok", vec![Candidate::new("X", "http://a/1")])),
        ];

        let outcome = Aggregator::new().aggregate(&resolved_film(), &providers).await;

        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(
            outcome.provider_status["boom"],
            ProviderStatus::Failed {
                kind: FailureKind::Failure,
                error_summary: PANIC_SUMMARY.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_candidate_fails_whole_provider() {
        let providers = vec![arc(StubProvider::returning(
            "sloppy",
            vec![Candidate::new("ok", "http://a/1"), Candidate::new("bad", "")],
        ))];

        let outcome = Aggregator::new().aggregate(&resolved_film(), &providers).await;

        assert!(outcome.candidates.is_empty());
        assert_eq!(
            outcome.provider_status["sloppy"],
            ProviderStatus::Failed {
                kind: FailureKind::InvalidShape,
                error_summary: "invalid result shape".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_raw_non_list_is_shape_error() {
        let providers = vec![arc(StubProvider::raw("object", json!({"url": "http://a/1"})))];

        let outcome = Aggregator::new().aggregate(&resolved_film(), &providers).await;

        assert!(outcome.candidates.is_empty());
        assert!(matches!(
            outcome.provider_status["object"],
            ProviderStatus::Failed {
                kind: FailureKind::InvalidShape,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_marks_pending_providers_as_timed_out() {
        let providers = vec![
            arc(StubProvider::hanging("stuck")),
            arc(StubProvider::returning("slow", vec![Candidate::new("S", "http://s/1")])
                .with_delay(Duration::from_millis(300))),
            arc(StubProvider::returning("fast", vec![Candidate::new("F", "http://f/1")])
                .with_delay(Duration::from_millis(10))),
        ];

        let outcome = Aggregator::with_deadline(Some(Duration::from_millis(100)))
            .aggregate(&resolved_film(), &providers)
            .await;

        assert_eq!(outcome.candidates, vec![Candidate::new("F", "http://f/1")]);
        for name in ["stuck", "slow"] {
            assert_eq!(
                outcome.provider_status[name],
                ProviderStatus::Failed {
                    kind: FailureKind::Timeout,
                    error_summary: TIMEOUT_SUMMARY.to_string(),
                }
            );
        }
    }

    #[tokio::test]
    async fn test_series_coordinates_are_defaulted_before_dispatch() {
        #[derive(Debug)]
        struct EchoProvider;

        #[async_trait::async_trait]
        impl SourceProvider for EchoProvider {
            fn name(&self) -> &str {
                "echo"
            }

            async fn invoke(
                &self,
                media: &MediaReference,
            ) -> Result<Vec<Candidate>, ProviderError> {
                Ok(vec![Candidate::new(
                    format!("{:?}/{:?}", media.season, media.episode),
                    "http://echo/1",
                )])
            }
        }

        let media = MediaReference::series("tt0944947", None, None).with_internal_id("1399");
        let providers: Vec<Arc<dyn SourceProvider>> = vec![Arc::new(EchoProvider)];

        let outcome = Aggregator::new().aggregate(&media, &providers).await;

        assert_eq!(outcome.candidates[0].title, "Some(1)/Some(1)");
    }
}
