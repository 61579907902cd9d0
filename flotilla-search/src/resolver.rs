//! Translation of external catalog ids into the TMDB ids providers expect.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use async_trait::async_trait;
use flotilla_core::config::ResolverConfig;
use flotilla_core::http::describe_request_error;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::errors::ResolveError;
use crate::media_id::{internal_id_from, is_imdb_id};
use crate::types::MediaKind;

/// Maps an external id to the internal id source providers expect.
#[async_trait]
pub trait MediaResolver: Send + Sync + std::fmt::Debug {
    /// Resolve `external_id` for the given kind.
    ///
    /// Returns `Ok(None)` when no mapping exists.
    ///
    /// # Errors
    /// - `ResolveError::MissingApiKey` - Resolution needs credentials that are not configured
    /// - `ResolveError::Network` - Network connectivity issues
    /// - `ResolveError::Upstream` - Resolution service answered with an error status
    /// - `ResolveError::Parse` - Resolution service response could not be parsed
    async fn resolve(
        &self,
        external_id: &str,
        kind: MediaKind,
    ) -> Result<Option<String>, ResolveError>;
}

/// Response of TMDB's `/find/{external_id}` endpoint.
#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    movie_results: Vec<FindResult>,
    #[serde(default)]
    tv_results: Vec<FindResult>,
}

#[derive(Debug, Deserialize)]
struct FindResult {
    id: u64,
}

/// Resolver backed by the TMDB API with an in-memory LRU cache.
///
/// TMDB ids pass through untouched; IMDb ids are looked up once and cached,
/// misses included.
#[derive(Debug)]
pub struct TmdbResolver {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    cache: Mutex<LruCache<(String, MediaKind), Option<String>>>,
}

impl TmdbResolver {
    /// Creates a resolver from configuration.
    pub fn new(client: reqwest::Client, config: &ResolverConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            client,
            base_url: config.tmdb_base_url.trim_end_matches('/').to_string(),
            api_key: config.tmdb_api_key.clone(),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    async fn find_by_imdb_id(
        &self,
        imdb_id: &str,
        kind: MediaKind,
    ) -> Result<Option<String>, ResolveError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ResolveError::MissingApiKey {
                external_id: imdb_id.to_string(),
            })?;

        let url = format!("{}/find/{imdb_id}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", api_key), ("external_source", "imdb_id")])
            .send()
            .await
            .map_err(|e| ResolveError::Network {
                reason: describe_request_error(&e, &url),
            })?;

        if !response.status().is_success() {
            return Err(ResolveError::Upstream {
                status: response.status().as_u16(),
            });
        }

        let found: FindResponse = response.json().await.map_err(|e| ResolveError::Parse {
            reason: format!("JSON parsing failed: {e}"),
        })?;

        let results = match kind {
            MediaKind::Film => &found.movie_results,
            MediaKind::Series => &found.tv_results,
        };
        Ok(results.first().map(|result| result.id.to_string()))
    }
}

#[async_trait]
impl MediaResolver for TmdbResolver {
    async fn resolve(
        &self,
        external_id: &str,
        kind: MediaKind,
    ) -> Result<Option<String>, ResolveError> {
        if let Some(internal_id) = internal_id_from(external_id) {
            return Ok(Some(internal_id));
        }

        if !is_imdb_id(external_id) {
            return Ok(None);
        }

        let key = (external_id.to_string(), kind);
        if let Some(cached) = self.cache.lock().get(&key) {
            tracing::trace!(external_id, "Resolver cache hit");
            return Ok(cached.clone());
        }

        let resolved = self.find_by_imdb_id(external_id, kind).await?;
        tracing::debug!(external_id, %kind, resolved = ?resolved, "Resolved external id");
        self.cache.lock().put(key, resolved.clone());
        Ok(resolved)
    }
}

/// Resolver backed by a fixed in-memory table.
///
/// Used in development mode and tests. TMDB ids pass through like they do
/// for [`TmdbResolver`].
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    mappings: HashMap<(String, MediaKind), String>,
}

impl StaticResolver {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with a few well-known titles for development.
    pub fn demo() -> Self {
        Self::new()
            .with_mapping("tt0133093", MediaKind::Film, "603")
            .with_mapping("tt0816692", MediaKind::Film, "157336")
            .with_mapping("tt0944947", MediaKind::Series, "1399")
            .with_mapping("tt0903747", MediaKind::Series, "1396")
    }

    /// Adds one mapping.
    pub fn with_mapping(
        mut self,
        external_id: impl Into<String>,
        kind: MediaKind,
        internal_id: impl Into<String>,
    ) -> Self {
        self.mappings
            .insert((external_id.into(), kind), internal_id.into());
        self
    }
}

#[async_trait]
impl MediaResolver for StaticResolver {
    async fn resolve(
        &self,
        external_id: &str,
        kind: MediaKind,
    ) -> Result<Option<String>, ResolveError> {
        if let Some(internal_id) = internal_id_from(external_id) {
            return Ok(Some(internal_id));
        }
        Ok(self
            .mappings
            .get(&(external_id.to_string(), kind))
            .cloned())
    }
}
