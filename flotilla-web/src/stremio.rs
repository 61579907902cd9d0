//! Stremio addon protocol types.

use std::collections::BTreeMap;

use flotilla_search::Candidate;
use flotilla_search::quality::quality_rank;
use serde::Serialize;

/// Addon id announced in the manifest.
pub const ADDON_ID: &str = "org.flotilla.streams";

/// Addon manifest served at `/manifest.json`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Reverse-domain addon id
    pub id: &'static str,
    /// Addon version
    pub version: &'static str,
    /// Display name
    pub name: &'static str,
    /// Short description shown in the addon catalog
    pub description: String,
    /// Resources this addon serves
    pub resources: Vec<&'static str>,
    /// Content types this addon serves
    pub types: Vec<&'static str>,
    /// Id prefixes this addon answers for
    pub id_prefixes: Vec<&'static str>,
    /// Catalogs, always empty
    pub catalogs: Vec<serde_json::Value>,
    /// Installation hints
    pub behavior_hints: ManifestHints,
}

/// Manifest-level behavior hints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestHints {
    /// Whether the addon accepts a configuration segment
    pub configurable: bool,
}

impl Manifest {
    /// Manifest for an addon aggregating `providers`.
    pub fn new(providers: &[String]) -> Self {
        let description = if providers.is_empty() {
            "Aggregates playable streams from configured sources".to_string()
        } else {
            format!(
                "Aggregates playable streams from {} sources: {}",
                providers.len(),
                providers.join(", ")
            )
        };

        Self {
            id: ADDON_ID,
            version: env!("CARGO_PKG_VERSION"),
            name: "Flotilla",
            description,
            resources: vec!["stream"],
            types: vec!["movie", "series"],
            id_prefixes: vec!["tt", "tmdb:"],
            catalogs: Vec::new(),
            behavior_hints: ManifestHints { configurable: true },
        }
    }
}

/// Body of a stream resource response.
#[derive(Debug, Clone, Serialize)]
pub struct StreamsResponse {
    /// Playable streams, best quality first
    pub streams: Vec<Stream>,
}

/// One playable stream as Stremio expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    /// Left column label, usually provider and quality
    pub name: String,
    /// Description line
    pub title: String,
    /// Playable URL
    pub url: String,
    /// Playback hints
    #[serde(skip_serializing_if = "StreamHints::is_empty")]
    pub behavior_hints: StreamHints,
}

/// Per-stream behavior hints.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamHints {
    /// Stream needs the local streaming server (custom headers)
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub not_web_ready: bool,
    /// Key Stremio uses to auto-pick the next episode's stream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binge_group: Option<String>,
    /// Size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_size: Option<u64>,
    /// Headers the player has to send
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_headers: Option<ProxyHeaders>,
}

impl StreamHints {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Request headers for proxied playback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProxyHeaders {
    /// Headers added to every request for the stream
    pub request: BTreeMap<String, String>,
}

impl From<Candidate> for Stream {
    fn from(candidate: Candidate) -> Self {
        let name = match candidate.quality.as_deref() {
            Some(quality) => format!("{}\n{quality}", candidate.display_name),
            None => candidate.display_name,
        };

        let proxy_headers = candidate
            .request_headers
            .filter(|headers| !headers.is_empty())
            .map(|request| ProxyHeaders { request });

        Self {
            name,
            title: candidate.title,
            url: candidate.url,
            behavior_hints: StreamHints {
                not_web_ready: proxy_headers.is_some(),
                binge_group: candidate.grouping_key,
                video_size: candidate.size_bytes,
                proxy_headers,
            },
        }
    }
}

/// Converts candidates into streams ordered by quality, best first.
///
/// Candidates of equal rank keep their merge order.
pub fn to_streams(mut candidates: Vec<Candidate>) -> Vec<Stream> {
    candidates.sort_by_key(|candidate| std::cmp::Reverse(quality_rank(candidate.quality.as_deref())));
    candidates.into_iter().map(Stream::from).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_manifest_shape() {
        let manifest = serde_json::to_value(Manifest::new(&["a".to_string()])).unwrap();
        assert_eq!(manifest["resources"], json!(["stream"]));
        assert_eq!(manifest["types"], json!(["movie", "series"]));
        assert_eq!(manifest["idPrefixes"], json!(["tt", "tmdb:"]));
        assert_eq!(manifest["catalogs"], json!([]));
        assert_eq!(manifest["behaviorHints"]["configurable"], json!(true));
    }

    #[test]
    fn test_stream_with_headers_is_not_web_ready() {
        let candidate = Candidate::new("Movie", "https://cdn.example/v.m3u8")
            .with_display_name("mirror")
            .with_quality("1080p")
            .with_header("Referer", "https://mirror.example/")
            .with_grouping_key("mirror-1080p");

        let stream = serde_json::to_value(Stream::from(candidate)).unwrap();

        assert_eq!(stream["name"], json!("mirror\n1080p"));
        assert_eq!(stream["behaviorHints"]["notWebReady"], json!(true));
        assert_eq!(stream["behaviorHints"]["bingeGroup"], json!("mirror-1080p"));
        assert_eq!(
            stream["behaviorHints"]["proxyHeaders"]["request"]["Referer"],
            json!("https://mirror.example/")
        );
    }

    #[test]
    fn test_plain_stream_has_no_hints() {
        let stream = serde_json::to_value(Stream::from(
            Candidate::new("Movie", "https://cdn.example/v.mp4").with_display_name("api"),
        ))
        .unwrap();

        assert_eq!(stream["name"], json!("api"));
        assert!(stream.get("behaviorHints").is_none());
    }

    #[test]
    fn test_streams_sorted_by_quality_stably() {
        let streams = to_streams(vec![
            Candidate::new("first-720", "http://a/1").with_quality("720p"),
            Candidate::new("unknown", "http://a/2"),
            Candidate::new("4k", "http://a/3").with_quality("2160p"),
            Candidate::new("second-720", "http://a/4").with_quality("720p"),
        ]);

        let titles: Vec<&str> = streams.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["4k", "first-720", "second-720", "unknown"]);
    }
}
