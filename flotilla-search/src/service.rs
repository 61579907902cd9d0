//! Stream lookup service: id parsing, resolution, provider selection and
//! aggregation behind a single call.

use std::sync::Arc;

use flotilla_core::http::build_http_client;
use flotilla_core::{FlotillaConfig, FlotillaError};

use crate::aggregator::Aggregator;
use crate::errors::MediaIdError;
use crate::media_id::parse_media_id;
use crate::registry::{ProviderRegistry, ProviderSelection};
use crate::resolver::{MediaResolver, StaticResolver, TmdbResolver};
use crate::types::{AggregationOutcome, MediaKind};

/// Answers stream requests for one process.
///
/// Cheap to clone; clones share the registry and the resolver cache.
#[derive(Debug, Clone)]
pub struct StreamService {
    registry: Arc<ProviderRegistry>,
    resolver: Arc<dyn MediaResolver>,
    aggregator: Aggregator,
}

impl StreamService {
    /// Creates a service from its parts.
    pub fn new(
        registry: ProviderRegistry,
        resolver: Arc<dyn MediaResolver>,
        aggregator: Aggregator,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            resolver,
            aggregator,
        }
    }

    /// Builds the service for the configured runtime mode.
    ///
    /// Development mode without a TMDB key resolves through a small static
    /// table so the demo providers stay reachable offline.
    ///
    /// # Errors
    /// - `FlotillaError::HttpClient` - Outbound HTTP client could not be built
    /// - `FlotillaError::Configuration` - Provider declarations are inconsistent
    pub fn from_config(config: &FlotillaConfig) -> Result<Self, FlotillaError> {
        let client = build_http_client(&config.network)?;

        let registry = ProviderRegistry::from_config(config, &client).map_err(|e| {
            FlotillaError::Configuration {
                reason: e.to_string(),
            }
        })?;

        let offline = config
            .runtime_mode
            .resolves_offline(config.resolver.tmdb_api_key.is_some());
        let resolver: Arc<dyn MediaResolver> = if offline {
            Arc::new(StaticResolver::demo())
        } else {
            Arc::new(TmdbResolver::new(client, &config.resolver))
        };

        tracing::info!(
            mode = %config.runtime_mode,
            providers = registry.len(),
            deadline_ms = config.aggregation.deadline.map(|d| d.as_millis() as u64),
            "Stream service ready"
        );

        Ok(Self::new(
            registry,
            resolver,
            Aggregator::with_deadline(config.aggregation.deadline),
        ))
    }

    /// Registered providers.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Looks up streams for a Stremio `(kind, id)` pair.
    ///
    /// Ids that cannot be resolved, and resolver failures, produce an empty
    /// outcome without invoking any provider.
    ///
    /// # Errors
    /// - `MediaIdError` - The id is malformed for the given kind
    pub async fn streams(
        &self,
        kind: MediaKind,
        raw_id: &str,
        selection: Option<&ProviderSelection>,
    ) -> Result<AggregationOutcome, MediaIdError> {
        let media = parse_media_id(kind, raw_id)?;

        let internal_id = match self.resolver.resolve(&media.external_id, kind).await {
            Ok(Some(internal_id)) => internal_id,
            Ok(None) => {
                tracing::info!(media = %media, "No internal id for media; returning no streams");
                return Ok(AggregationOutcome::empty());
            }
            Err(error) => {
                tracing::warn!(media = %media, %error, "Id resolution failed; returning no streams");
                return Ok(AggregationOutcome::empty());
            }
        };

        let media = media.with_internal_id(internal_id);
        let providers = self.registry.select(selection);
        Ok(self.aggregator.aggregate(&media, &providers).await)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::providers::{SourceProvider, StubProvider};
    use crate::types::{Candidate, ProviderStatus};

    fn service_with(stubs: Vec<StubProvider>) -> StreamService {
        let mut registry = ProviderRegistry::new();
        for stub in stubs {
            let provider: Arc<dyn SourceProvider> = Arc::new(stub);
            registry.register(provider).unwrap();
        }
        StreamService::new(registry, Arc::new(StaticResolver::demo()), Aggregator::new())
    }

    #[tokio::test]
    async fn test_streams_for_resolved_film() {
        let service = service_with(vec![
            StubProvider::returning("a", vec![Candidate::new("A", "http://a/1")]),
            StubProvider::failing("b", "down"),
        ]);

        let outcome = service
            .streams(MediaKind::Film, "tt0133093", None)
            .await
            .unwrap();

        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.provider_status["a"], ProviderStatus::Succeeded { count: 1 });
        assert!(!outcome.provider_status["b"].is_success());
    }

    #[tokio::test]
    async fn test_resolution_miss_invokes_nothing() {
        let stub = StubProvider::returning("a", vec![Candidate::new("A", "http://a/1")]);
        let counter = stub.invocation_counter();
        let service = service_with(vec![stub]);

        let outcome = service
            .streams(MediaKind::Film, "tt0000001", None)
            .await
            .unwrap();

        assert!(outcome.is_empty());
        assert!(outcome.provider_status.is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_selection_limits_providers() {
        let skipped = StubProvider::returning("b", vec![Candidate::new("B", "http://b/1")]);
        let counter = skipped.invocation_counter();
        let service = service_with(vec![
            StubProvider::returning("a", vec![Candidate::new("A", "http://a/1")]),
            skipped,
        ]);

        let selection = ProviderSelection::parse("a");
        let outcome = service
            .streams(MediaKind::Series, "tmdb:1399:1:2", Some(&selection))
            .await
            .unwrap();

        assert_eq!(outcome.provider_status.len(), 1);
        assert!(outcome.provider_status.contains_key("a"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_id_is_rejected() {
        let service = service_with(Vec::new());
        let error = service
            .streams(MediaKind::Film, "not-an-id", None)
            .await
            .unwrap_err();
        assert!(matches!(error, MediaIdError::UnsupportedId { .. }));
    }

    #[tokio::test]
    async fn test_development_service_from_config() {
        let service = StreamService::from_config(&FlotillaConfig::for_testing()).unwrap();
        assert!(!service.registry().is_empty());

        let outcome = service
            .streams(MediaKind::Film, "tt0133093", None)
            .await
            .unwrap();

        assert_eq!(outcome.provider_status.len(), service.registry().len());
        assert!(!outcome.candidates.is_empty());
    }
}
