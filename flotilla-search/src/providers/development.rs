//! Demo provider for offline development.

use std::ops::RangeInclusive;
use std::time::Duration;

use async_trait::async_trait;
use rand::{Rng, rng};

use super::SourceProvider;
use crate::errors::ProviderError;
use crate::types::{Candidate, MediaKind, MediaReference};

/// What a demo provider does once its simulated latency has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoBehavior {
    /// Return a couple of quality variants
    Streams,
    /// Return an empty list
    Empty,
    /// Fail like an unreachable upstream
    Fail,
}

/// Development provider returning realistic demo streams without network access.
///
/// Latency is drawn from `latency_ms` on every invocation so the concurrent
/// fan-out can be observed in the logs.
#[derive(Debug)]
pub struct DevelopmentProvider {
    name: String,
    latency_ms: RangeInclusive<u64>,
    behavior: DemoBehavior,
}

impl DevelopmentProvider {
    /// Creates a demo provider.
    pub fn new(name: impl Into<String>, latency_ms: RangeInclusive<u64>, behavior: DemoBehavior) -> Self {
        Self {
            name: name.into(),
            latency_ms,
            behavior,
        }
    }

    /// The demo line-up registered in development mode.
    pub fn lineup() -> Vec<Self> {
        vec![
            Self::new("demo-harbor", 40..=120, DemoBehavior::Streams),
            Self::new("demo-lighthouse", 80..=250, DemoBehavior::Streams),
            Self::new("demo-shoal", 10..=30, DemoBehavior::Empty),
            Self::new("demo-reef", 100..=300, DemoBehavior::Fail),
        ]
    }

    fn demo_candidates(&self, media: &MediaReference) -> Vec<Candidate> {
        let slug = match media.kind {
            MediaKind::Film => media.lookup_id().to_string(),
            MediaKind::Series => format!(
                "{}/s{}e{}",
                media.lookup_id(),
                media.season.unwrap_or(1),
                media.episode.unwrap_or(1)
            ),
        };

        [("1080p", 2_400_000_000_u64), ("720p", 1_100_000_000)]
            .into_iter()
            .map(|(quality, size)| {
                let mut candidate = Candidate::new(
                    format!("{media} [{quality}]"),
                    format!("https://demo.example.com/{}/{slug}/{quality}.m3u8", self.name),
                )
                .with_display_name(self.name.clone())
                .with_quality(quality)
                .with_size(size);
                if media.kind == MediaKind::Series {
                    candidate = candidate.with_grouping_key(format!("{}-{quality}", self.name));
                }
                candidate
            })
            .collect()
    }
}

#[async_trait]
impl SourceProvider for DevelopmentProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, media: &MediaReference) -> Result<Vec<Candidate>, ProviderError> {
        let latency = rng().random_range(self.latency_ms.clone());
        tokio::time::sleep(Duration::from_millis(latency)).await;

        match self.behavior {
            DemoBehavior::Streams => Ok(self.demo_candidates(media)),
            DemoBehavior::Empty => Ok(Vec::new()),
            DemoBehavior::Fail => Err(ProviderError::Network {
                reason: format!("Failed to connect: https://{}.example.com", self.name),
            }),
        }
    }
}
