//! Provider that scrapes stream links from an embed page on a rotating mirror.
//!
//! Mirror sites move between domains; the current one is published at a
//! separate "domain source" url. The resolved domain is cached per provider.

use async_trait::async_trait;
use flotilla_core::config::EmbedProviderSpec;
use flotilla_core::http::describe_request_error;
use regex::Regex;
use reqwest::StatusCode;

use super::{DomainCache, SourceProvider, expand_template};
use crate::errors::{ProviderError, RegistryError};
use crate::quality::infer_quality;
use crate::types::{Candidate, MediaKind, MediaReference};

const STREAM_LINK_PATTERN: &str =
    r#"https?://[^\s"'<>\\]+?\.(?:m3u8|mp4)(?:[/?#][^\s"'<>\\]*)?"#;

/// Embed page scraper with a cached mirror domain.
#[derive(Debug)]
pub struct EmbedPageProvider {
    name: String,
    client: reqwest::Client,
    domain_source_url: String,
    movie_path: String,
    series_path: Option<String>,
    domains: DomainCache,
    stream_link: Regex,
}

impl EmbedPageProvider {
    /// Creates a provider from its declaration.
    ///
    /// # Errors
    /// - `RegistryError::InvalidProvider` - Link pattern failed to compile
    pub fn new(
        client: reqwest::Client,
        spec: &EmbedProviderSpec,
        domain_ttl: std::time::Duration,
    ) -> Result<Self, RegistryError> {
        let stream_link =
            Regex::new(STREAM_LINK_PATTERN).map_err(|e| RegistryError::InvalidProvider {
                name: spec.name.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            name: spec.name.clone(),
            client,
            domain_source_url: spec.domain_source_url.clone(),
            movie_path: spec.movie_path.clone(),
            series_path: spec.series_path.clone(),
            domains: DomainCache::new(domain_ttl),
            stream_link,
        })
    }

    /// Current mirror origin (`https://host`), from cache or the domain source.
    async fn current_domain(&self) -> Result<String, ProviderError> {
        if let Some(domain) = self.domains.get() {
            return Ok(domain);
        }

        let body = self.fetch_text(&self.domain_source_url).await?.unwrap_or_default();
        let domain = normalize_domain(&body).ok_or_else(|| ProviderError::Parse {
            reason: format!("no domain published at {}", self.domain_source_url),
        })?;

        tracing::debug!(provider = %self.name, %domain, "Resolved mirror domain");
        self.domains.set(domain.clone());
        Ok(domain)
    }

    /// GET returning the body, `None` for 404.
    async fn fetch_text(&self, url: &str) -> Result<Option<String>, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Network {
                reason: describe_request_error(&e, url),
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ProviderError::Upstream {
                status: response.status().as_u16(),
            });
        }

        response
            .text()
            .await
            .map(Some)
            .map_err(|e| ProviderError::Network {
                reason: describe_request_error(&e, url),
            })
    }

    /// Extracts unique stream links in page order.
    fn extract_links(&self, page: &str) -> Vec<String> {
        // Links arrive JS-escaped in scripts and entity-encoded in attributes.
        let unescaped = page.replace("\\/", "/").replace("&amp;", "&");
        let mut links: Vec<String> = Vec::new();
        for found in self.stream_link.find_iter(&unescaped) {
            let link = found.as_str().to_string();
            if !links.contains(&link) {
                links.push(link);
            }
        }
        links
    }

    fn to_candidate(&self, media: &MediaReference, domain: &str, link: String) -> Candidate {
        let mut candidate = Candidate::new(media.to_string(), link)
            .with_display_name(self.name.clone())
            .with_header("Referer", format!("{domain}/"))
            .with_header("Origin", domain.to_string());
        candidate.quality = infer_quality(&candidate.url);
        if media.kind == MediaKind::Series {
            candidate.grouping_key = Some(format!("{}-{}", self.name, media.external_id));
        }
        candidate
    }
}

/// Turns a published domain (`mirror.example.com`, `https://mirror.example.com/`)
/// into an origin without trailing slash.
fn normalize_domain(body: &str) -> Option<String> {
    let line = body.lines().map(str::trim).find(|line| !line.is_empty())?;
    let origin = if line.starts_with("http://") || line.starts_with("https://") {
        line.to_string()
    } else {
        format!("https://{line}")
    };
    let parsed = url::Url::parse(&origin).ok()?;
    parsed.host_str()?;
    Some(origin.trim_end_matches('/').to_string())
}

#[async_trait]
impl SourceProvider for EmbedPageProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, media: &MediaReference) -> Result<Vec<Candidate>, ProviderError> {
        let path = match media.kind {
            MediaKind::Film => Some(self.movie_path.as_str()),
            MediaKind::Series => self.series_path.as_deref(),
        };
        let Some(path) = path else {
            return Ok(Vec::new());
        };

        let domain = self.current_domain().await?;
        let page_url = format!("{domain}{}", expand_template(path, media));

        let page = match self.fetch_text(&page_url).await {
            Ok(Some(page)) => page,
            Ok(None) => return Ok(Vec::new()),
            Err(error) => {
                // The mirror may have moved; refresh the domain on the next request.
                self.domains.invalidate();
                return Err(error);
            }
        };

        let candidates: Vec<Candidate> = self
            .extract_links(&page)
            .into_iter()
            .map(|link| self.to_candidate(media, &domain, link))
            .collect();

        tracing::debug!(provider = %self.name, page = %page_url, links = candidates.len(), "Scraped embed page");
        Ok(candidates)
    }
}
