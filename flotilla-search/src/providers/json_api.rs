//! Provider backed by an upstream JSON stream API.

use async_trait::async_trait;
use flotilla_core::config::JsonProviderSpec;
use flotilla_core::http::describe_request_error;
use reqwest::StatusCode;
use serde_json::Value;

use super::{SourceProvider, expand_template};
use crate::coerce::{candidates_from_value, select_list};
use crate::errors::ProviderError;
use crate::quality::infer_quality;
use crate::types::{Candidate, MediaKind, MediaReference};

/// Provider that asks a JSON API for streams.
///
/// The request url comes from a template per media kind. The response body (or
/// the part selected by `list_pointer`) must be a list of candidate objects.
#[derive(Debug)]
pub struct JsonApiProvider {
    name: String,
    client: reqwest::Client,
    movie_template: String,
    series_template: Option<String>,
    list_pointer: Option<String>,
}

impl JsonApiProvider {
    /// Creates a provider from its declaration.
    pub fn new(client: reqwest::Client, spec: &JsonProviderSpec) -> Self {
        Self {
            name: spec.name.clone(),
            client,
            movie_template: spec.movie_template.clone(),
            series_template: spec.series_template.clone(),
            list_pointer: spec.list_pointer.clone(),
        }
    }

    /// Request url for this media, or `None` when the kind is not served.
    fn request_url(&self, media: &MediaReference) -> Option<String> {
        let template = match media.kind {
            MediaKind::Film => Some(self.movie_template.as_str()),
            MediaKind::Series => self.series_template.as_deref(),
        }?;
        Some(expand_template(template, media))
    }

    /// Fills in what the upstream left blank: source label and quality.
    fn finish(&self, candidate: Candidate) -> Candidate {
        let mut candidate = candidate;
        if candidate.display_name.is_empty() {
            candidate.display_name = self.name.clone();
        }
        if candidate.quality.is_none() {
            candidate.quality =
                infer_quality(&candidate.title).or_else(|| infer_quality(&candidate.url));
        }
        candidate
    }
}

#[async_trait]
impl SourceProvider for JsonApiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, media: &MediaReference) -> Result<Vec<Candidate>, ProviderError> {
        let Some(url) = self.request_url(media) else {
            tracing::debug!(provider = %self.name, kind = %media.kind, "Media kind not served");
            return Ok(Vec::new());
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Network {
                reason: describe_request_error(&e, &url),
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            return Err(ProviderError::Upstream {
                status: response.status().as_u16(),
            });
        }

        let body: Value = response.json().await.map_err(|e| ProviderError::Parse {
            reason: format!("JSON parsing failed: {e}"),
        })?;

        let candidates = candidates_from_value(select_list(body, self.list_pointer.as_deref()))?;

        Ok(candidates
            .into_iter()
            .map(|candidate| self.finish(candidate))
            .collect())
    }
}
