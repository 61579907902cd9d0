//! Data types shared by providers, the aggregator and the presentation layer.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of media a request is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A single film (Stremio type `movie`)
    Film,
    /// One episode of a series (Stremio type `series`)
    Series,
}

impl MediaKind {
    /// Content type string used by Stremio for this kind.
    pub fn stremio_type(self) -> &'static str {
        match self {
            MediaKind::Film => "movie",
            MediaKind::Series => "series",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stremio_type())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = crate::errors::MediaIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movie" | "film" => Ok(MediaKind::Film),
            "series" | "tv" => Ok(MediaKind::Series),
            _ => Err(crate::errors::MediaIdError::UnsupportedType {
                media_type: s.to_string(),
            }),
        }
    }
}

/// Normalized identifier of the media a request is about.
///
/// Built once per inbound request and never mutated afterwards; providers
/// receive it by shared reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    /// Catalog identifier as received (`tt0133093`, `tmdb:603`, ...)
    pub external_id: String,
    /// Identifier providers expect, once resolved
    pub internal_id: Option<String>,
    /// Film or series
    pub kind: MediaKind,
    /// Season number for series
    pub season: Option<u32>,
    /// Episode number for series
    pub episode: Option<u32>,
}

impl MediaReference {
    /// Reference to a film.
    pub fn film(external_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            internal_id: None,
            kind: MediaKind::Film,
            season: None,
            episode: None,
        }
    }

    /// Reference to one episode of a series.
    pub fn series(external_id: impl Into<String>, season: Option<u32>, episode: Option<u32>) -> Self {
        Self {
            external_id: external_id.into(),
            internal_id: None,
            kind: MediaKind::Series,
            season,
            episode,
        }
    }

    /// Returns this reference with the resolved internal id attached.
    pub fn with_internal_id(mut self, internal_id: impl Into<String>) -> Self {
        self.internal_id = Some(internal_id.into());
        self
    }

    /// Fills missing series coordinates with 1; films carry none.
    pub fn normalized(mut self) -> Self {
        match self.kind {
            MediaKind::Series => {
                self.season = Some(self.season.unwrap_or(1));
                self.episode = Some(self.episode.unwrap_or(1));
            }
            MediaKind::Film => {
                self.season = None;
                self.episode = None;
            }
        }
        self
    }

    /// Whether the internal id has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.internal_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// Internal id if resolved, external id otherwise.
    pub fn lookup_id(&self) -> &str {
        self.internal_id.as_deref().unwrap_or(&self.external_id)
    }
}

impl fmt::Display for MediaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.season, self.episode) {
            (MediaKind::Series, Some(season), Some(episode)) => {
                write!(f, "{} S{season:02}E{episode:02}", self.external_id)
            }
            _ => write!(f, "{} ({})", self.external_id, self.kind),
        }
    }
}

/// One playable link emitted by a source provider.
///
/// Absent optional fields deserialize to `None`; `display_name` and `title`
/// default to empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Short label shown as the stream's source, usually the provider name
    #[serde(default, alias = "name")]
    pub display_name: String,
    /// Descriptive title of the link
    #[serde(default)]
    pub title: String,
    /// Playable resource locator
    pub url: String,
    /// Free-form quality label (`1080p`, `4K`, `CAM`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    /// Size of the resource in bytes
    #[serde(default, alias = "size", skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Headers the player must send to fetch `url`
    #[serde(default, alias = "headers", skip_serializing_if = "Option::is_none")]
    pub request_headers: Option<BTreeMap<String, String>>,
    /// Key grouping links that belong together across episodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping_key: Option<String>,
}

impl Candidate {
    /// Creates a candidate with only a title and url.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the source label.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Sets the quality label.
    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    /// Sets the size in bytes.
    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    /// Adds one request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Sets the grouping key.
    pub fn with_grouping_key(mut self, grouping_key: impl Into<String>) -> Self {
        self.grouping_key = Some(grouping_key.into());
        self
    }

    /// Checks the candidate is usable: the url must be a non-empty absolute URL.
    ///
    /// # Errors
    /// - `String` - Description of what is malformed
    pub fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("candidate has an empty url".to_string());
        }
        url::Url::parse(&self.url)
            .map(|_| ())
            .map_err(|e| format!("candidate url '{}' is invalid: {e}", self.url))
    }
}

/// Why a provider contributed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Did not settle before the aggregation deadline
    Timeout,
    /// Returned an error or panicked
    Failure,
    /// Produced something other than a list of well-formed candidates
    InvalidShape,
}

/// Terminal state of one provider within one aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProviderStatus {
    /// Provider settled with a list; `count` candidates were merged
    Succeeded {
        /// Number of candidates contributed
        count: usize,
    },
    /// Provider failed and contributed nothing
    Failed {
        /// Failure classification
        kind: FailureKind,
        /// Short human-readable reason
        error_summary: String,
    },
}

impl ProviderStatus {
    /// Whether the provider settled successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, ProviderStatus::Succeeded { .. })
    }

    /// Number of candidates contributed; zero for failures.
    pub fn count(&self) -> usize {
        match self {
            ProviderStatus::Succeeded { count } => *count,
            ProviderStatus::Failed { .. } => 0,
        }
    }
}

/// Merged result of one aggregation call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregationOutcome {
    /// Every candidate contributed by a succeeding provider
    pub candidates: Vec<Candidate>,
    /// Terminal state of every invoked provider, keyed by provider name
    pub provider_status: BTreeMap<String, ProviderStatus>,
}

impl AggregationOutcome {
    /// Outcome of an aggregation that invoked no provider.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether no candidate was found.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Names of providers that failed.
    pub fn failed_providers(&self) -> Vec<&str> {
        self.provider_status
            .iter()
            .filter(|(_, status)| !status.is_success())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// True when at least one provider ran and every one of them failed.
    ///
    /// Distinguishes "everything failed" from "tried and found nothing".
    pub fn all_failed(&self) -> bool {
        !self.provider_status.is_empty()
            && self.provider_status.values().all(|status| !status.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_normalization_defaults_to_first_episode() {
        let media = MediaReference::series("tt0944947", None, Some(4)).normalized();
        assert_eq!(media.season, Some(1));
        assert_eq!(media.episode, Some(4));

        let film = MediaReference {
            season: Some(2),
            ..MediaReference::film("tt0133093")
        }
        .normalized();
        assert_eq!(film.season, None);
    }

    #[test]
    fn test_media_reference_display() {
        let episode = MediaReference::series("tt0944947", Some(1), Some(2));
        assert_eq!(episode.to_string(), "tt0944947 S01E02");
        assert_eq!(MediaReference::film("tt0133093").to_string(), "tt0133093 (movie)");
    }

    #[test]
    fn test_resolution_state() {
        let media = MediaReference::film("tt0133093");
        assert!(!media.is_resolved());
        assert_eq!(media.lookup_id(), "tt0133093");

        let media = media.with_internal_id("603");
        assert!(media.is_resolved());
        assert_eq!(media.lookup_id(), "603");
    }

    #[test]
    fn test_candidate_defaults_for_absent_fields() {
        let candidate: Candidate =
            serde_json::from_value(serde_json::json!({"url": "http://a/1", "quality": "1080p"}))
                .unwrap();

        assert_eq!(candidate.display_name, "");
        assert_eq!(candidate.title, "");
        assert_eq!(candidate.quality.as_deref(), Some("1080p"));
        assert_eq!(candidate.size_bytes, None);
        assert_eq!(candidate.request_headers, None);
    }

    #[test]
    fn test_candidate_validation() {
        assert!(Candidate::new("X", "http://a/1").validate().is_ok());
        assert!(Candidate::new("X", "").validate().is_err());
        assert!(Candidate::new("X", "not a url").validate().is_err());
    }

    #[test]
    fn test_candidate_builder_headers() {
        let candidate = Candidate::new("X", "https://cdn.example.com/x.m3u8")
            .with_header("Referer", "https://mirror.example.com/")
            .with_header("Origin", "https://mirror.example.com");

        let headers = candidate.request_headers.unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Referer"], "https://mirror.example.com/");
    }

    #[test]
    fn test_outcome_failure_accounting() {
        let mut outcome = AggregationOutcome::empty();
        assert!(!outcome.all_failed());

        outcome.provider_status.insert(
            "a".to_string(),
            ProviderStatus::Failed {
                kind: FailureKind::Timeout,
                error_summary: "timeout".to_string(),
            },
        );
        assert!(outcome.all_failed());

        outcome
            .provider_status
            .insert("b".to_string(), ProviderStatus::Succeeded { count: 0 });
        assert!(!outcome.all_failed());
        assert_eq!(outcome.failed_providers(), vec!["a"]);
    }

    #[test]
    fn test_status_serialization() {
        let status = ProviderStatus::Failed {
            kind: FailureKind::InvalidShape,
            error_summary: "invalid result shape".to_string(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["kind"], "invalid_shape");
    }
}
