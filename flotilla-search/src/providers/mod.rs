//! Source provider implementations.

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::types::{Candidate, MediaReference};

pub mod development;
pub mod domain_cache;
pub mod embed_page;
pub mod json_api;
#[cfg(any(test, feature = "test-utils"))]
pub mod stub;

pub use development::{DemoBehavior, DevelopmentProvider};
pub use domain_cache::DomainCache;
pub use embed_page::EmbedPageProvider;
pub use json_api::JsonApiProvider;
#[cfg(any(test, feature = "test-utils"))]
pub use stub::{StubProvider, StubResponse};

/// Trait for stream source providers.
///
/// Each implementation knows how to obtain playable links from one upstream
/// site or API. The aggregator treats implementations as black boxes.
#[async_trait]
pub trait SourceProvider: Send + Sync + std::fmt::Debug {
    /// Unique, human-readable provider name.
    fn name(&self) -> &str;

    /// Fetch playable candidates for a resolved media reference.
    ///
    /// Returns an empty list when the upstream simply has nothing for this
    /// media; errors are reserved for exceptional conditions.
    ///
    /// # Errors
    /// - `ProviderError::Network` - Network connectivity issues
    /// - `ProviderError::Upstream` - Upstream answered with an error status
    /// - `ProviderError::Parse` - Upstream response could not be parsed
    /// - `ProviderError::InvalidShape` - Upstream produced malformed candidates
    async fn invoke(&self, media: &MediaReference) -> Result<Vec<Candidate>, ProviderError>;
}

/// Substitutes `{id}`, `{external_id}`, `{season}` and `{episode}` in a url template.
pub(crate) fn expand_template(template: &str, media: &MediaReference) -> String {
    template
        .replace("{id}", media.lookup_id())
        .replace("{external_id}", &media.external_id)
        .replace("{season}", &media.season.unwrap_or(1).to_string())
        .replace("{episode}", &media.episode.unwrap_or(1).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_template() {
        let media = MediaReference::series("tt0944947", Some(2), Some(5)).with_internal_id("1399");
        assert_eq!(
            expand_template("https://api.example.com/tv/{id}/{season}/{episode}?imdb={external_id}", &media),
            "https://api.example.com/tv/1399/2/5?imdb=tt0944947"
        );
    }
}
