//! Centralized configuration for Flotilla.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::str::FromStr;
use std::time::Duration;

use crate::mode::RuntimeMode;

/// Central configuration for all Flotilla components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct FlotillaConfig {
    pub server: ServerConfig,
    pub aggregation: AggregationConfig,
    pub resolver: ResolverConfig,
    pub network: NetworkConfig,
    pub providers: ProvidersConfig,
    pub runtime_mode: RuntimeMode,
}

/// Addon HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind to
    pub host: String,
    /// TCP port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7000,
        }
    }
}

/// Fan-out behavior of the aggregator.
#[derive(Debug, Clone, Default)]
pub struct AggregationConfig {
    /// Deadline after which still-pending providers are recorded as timed out.
    /// `None` waits for every provider to settle.
    pub deadline: Option<Duration>,
}

/// External-id resolution against TMDB.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// TMDB v3 API key; IMDb ids cannot be translated without one
    pub tmdb_api_key: Option<String>,
    /// TMDB API root
    pub tmdb_base_url: String,
    /// Number of resolved ids kept in memory
    pub cache_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            tmdb_base_url: "https://api.themoviedb.org/3".to_string(),
            cache_size: 1024,
        }
    }
}

/// Outbound HTTP settings shared by the resolver and every provider.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Per-request timeout applied by the HTTP client
    pub request_timeout: Duration,
    /// User agent for upstream requests
    pub user_agent: String,
    /// Maximum redirects followed per request
    pub max_redirects: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            user_agent: format!("flotilla/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 5,
        }
    }
}

/// Source providers built at startup.
#[derive(Debug, Clone)]
pub struct ProvidersConfig {
    /// Providers backed by a JSON stream API
    pub json: Vec<JsonProviderSpec>,
    /// Providers that scrape an embed page on a rotating mirror domain
    pub embed: Vec<EmbedProviderSpec>,
    /// How long a resolved mirror domain stays cached
    pub domain_ttl: Duration,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            json: Vec::new(),
            embed: Vec::new(),
            domain_ttl: Duration::from_secs(30 * 60),
        }
    }
}

/// Declaration of a JSON API provider.
///
/// Textual form: `name|movie_template|series_template[|list_pointer]`.
/// Templates may use `{id}`, `{season}` and `{episode}`; an empty series
/// template means the provider only serves films.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonProviderSpec {
    pub name: String,
    pub movie_template: String,
    pub series_template: Option<String>,
    /// JSON pointer to the stream list inside the response body
    pub list_pointer: Option<String>,
}

impl FromStr for JsonProviderSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('|').map(str::trim).collect();
        if !(3..=4).contains(&parts.len()) {
            return Err(format!(
                "Invalid JSON provider '{s}': expected name|movie_template|series_template[|list_pointer]"
            ));
        }
        if parts[0].is_empty() || parts[1].is_empty() {
            return Err(format!(
                "Invalid JSON provider '{s}': name and movie template are required"
            ));
        }

        Ok(Self {
            name: parts[0].to_string(),
            movie_template: parts[1].to_string(),
            series_template: non_empty(parts[2]),
            list_pointer: parts.get(3).and_then(|pointer| non_empty(pointer)),
        })
    }
}

/// Declaration of an embed page provider.
///
/// Textual form: `name|domain_source_url|movie_path|series_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedProviderSpec {
    pub name: String,
    /// URL whose body names the provider's current mirror domain
    pub domain_source_url: String,
    pub movie_path: String,
    pub series_path: Option<String>,
}

impl FromStr for EmbedProviderSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('|').map(str::trim).collect();
        if parts.len() != 4 || parts[..3].iter().any(|part| part.is_empty()) {
            return Err(format!(
                "Invalid embed provider '{s}': expected name|domain_source_url|movie_path|series_path"
            ));
        }

        Ok(Self {
            name: parts[0].to_string(),
            domain_source_url: parts[1].to_string(),
            movie_path: parts[2].to_string(),
            series_path: non_empty(parts[3]),
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parses a `;`-separated list of provider declarations, skipping bad entries.
fn parse_specs<T>(raw: &str, variable: &str) -> Vec<T>
where
    T: FromStr<Err = String>,
{
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse::<T>() {
            Ok(spec) => Some(spec),
            Err(reason) => {
                tracing::warn!(variable, %reason, "Skipping provider declaration");
                None
            }
        })
        .collect()
}

impl FlotillaConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Server overrides
        if let Some(host) = lookup("FLOTILLA_HOST") {
            config.server.host = host;
        }

        if let Some(port) = lookup("FLOTILLA_PORT")
            && let Ok(port) = port.parse::<u16>()
        {
            config.server.port = port;
        }

        // Aggregation overrides
        if let Some(deadline) = lookup("FLOTILLA_AGGREGATION_DEADLINE_MS")
            && let Ok(millis) = deadline.parse::<u64>()
        {
            config.aggregation.deadline = if millis == 0 {
                None
            } else {
                Some(Duration::from_millis(millis))
            };
        }

        // Resolver overrides
        if let Some(api_key) = lookup("FLOTILLA_TMDB_API_KEY").filter(|key| !key.is_empty()) {
            config.resolver.tmdb_api_key = Some(api_key);
        }

        if let Some(base_url) = lookup("FLOTILLA_TMDB_BASE_URL") {
            config.resolver.tmdb_base_url = base_url.trim_end_matches('/').to_string();
        }

        if let Some(size) = lookup("FLOTILLA_RESOLVER_CACHE_SIZE")
            && let Ok(size) = size.parse::<usize>()
        {
            config.resolver.cache_size = size;
        }

        // Network overrides
        if let Some(timeout) = lookup("FLOTILLA_HTTP_TIMEOUT_SECS")
            && let Ok(seconds) = timeout.parse::<u64>()
        {
            config.network.request_timeout = Duration::from_secs(seconds);
        }

        if let Some(user_agent) = lookup("FLOTILLA_USER_AGENT") {
            config.network.user_agent = user_agent;
        }

        // Provider declarations
        if let Some(raw) = lookup("FLOTILLA_JSON_PROVIDERS") {
            config.providers.json = parse_specs(&raw, "FLOTILLA_JSON_PROVIDERS");
        }

        if let Some(raw) = lookup("FLOTILLA_EMBED_PROVIDERS") {
            config.providers.embed = parse_specs(&raw, "FLOTILLA_EMBED_PROVIDERS");
        }

        if let Some(ttl) = lookup("FLOTILLA_DOMAIN_TTL_SECS")
            && let Ok(seconds) = ttl.parse::<u64>()
        {
            config.providers.domain_ttl = Duration::from_secs(seconds);
        }

        if let Some(mode) = lookup("FLOTILLA_MODE")
            && let Ok(mode) = mode.parse::<RuntimeMode>()
        {
            config.runtime_mode = mode;
        }

        config
    }

    /// Creates a configuration for offline development with demo providers.
    pub fn for_development() -> Self {
        Self {
            runtime_mode: RuntimeMode::Development,
            ..Default::default()
        }
    }

    /// Creates a configuration optimized for testing.
    pub fn for_testing() -> Self {
        Self {
            runtime_mode: RuntimeMode::Development,
            aggregation: AggregationConfig {
                deadline: Some(Duration::from_secs(2)),
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_values() {
        let config = FlotillaConfig::default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.aggregation.deadline, None);
        assert_eq!(config.resolver.cache_size, 1024);
        assert_eq!(config.network.request_timeout, Duration::from_secs(15));
        assert!(config.providers.json.is_empty());
        assert_eq!(config.runtime_mode, RuntimeMode::Production);
    }

    #[test]
    fn test_env_override() {
        let config = FlotillaConfig::from_lookup(lookup_from(&[
            ("FLOTILLA_PORT", "8080"),
            ("FLOTILLA_AGGREGATION_DEADLINE_MS", "2500"),
            ("FLOTILLA_TMDB_API_KEY", "secret"),
            ("FLOTILLA_TMDB_BASE_URL", "http://localhost:9000/3/"),
            ("FLOTILLA_HTTP_TIMEOUT_SECS", "5"),
            ("FLOTILLA_MODE", "dev"),
        ]));

        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.aggregation.deadline,
            Some(Duration::from_millis(2500))
        );
        assert_eq!(config.resolver.tmdb_api_key.as_deref(), Some("secret"));
        assert_eq!(config.resolver.tmdb_base_url, "http://localhost:9000/3");
        assert_eq!(config.network.request_timeout, Duration::from_secs(5));
        assert_eq!(config.runtime_mode, RuntimeMode::Development);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = FlotillaConfig::from_lookup(lookup_from(&[
            ("FLOTILLA_PORT", "not-a-port"),
            ("FLOTILLA_AGGREGATION_DEADLINE_MS", "soon"),
            ("FLOTILLA_MODE", "staging"),
        ]));

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.aggregation.deadline, None);
        assert_eq!(config.runtime_mode, RuntimeMode::Production);
    }

    #[test]
    fn test_zero_deadline_disables_timeout() {
        let config =
            FlotillaConfig::from_lookup(lookup_from(&[("FLOTILLA_AGGREGATION_DEADLINE_MS", "0")]));
        assert_eq!(config.aggregation.deadline, None);
    }

    #[test]
    fn test_provider_declarations() {
        let config = FlotillaConfig::from_lookup(lookup_from(&[
            (
                "FLOTILLA_JSON_PROVIDERS",
                "alpha|http://a/movie/{id}|http://a/tv/{id}/{season}/{episode}|/streams; \
                 beta|http://b/{id}|; broken",
            ),
            (
                "FLOTILLA_EMBED_PROVIDERS",
                "mirror|http://domains/latest|/embed/movie/{id}|/embed/tv/{id}/{season}/{episode}",
            ),
        ]));

        assert_eq!(config.providers.json.len(), 2);
        assert_eq!(config.providers.json[0].name, "alpha");
        assert_eq!(
            config.providers.json[0].list_pointer.as_deref(),
            Some("/streams")
        );
        assert_eq!(config.providers.json[1].series_template, None);
        assert_eq!(config.providers.embed.len(), 1);
        assert_eq!(
            config.providers.embed[0].domain_source_url,
            "http://domains/latest"
        );
    }

    #[test]
    fn test_json_provider_spec_rejects_missing_template() {
        assert!("alpha||".parse::<JsonProviderSpec>().is_err());
        assert!("alpha".parse::<JsonProviderSpec>().is_err());
    }

    #[test]
    fn test_config_presets() {
        let testing_config = FlotillaConfig::for_testing();
        assert!(testing_config.runtime_mode.serves_demo_streams());
        assert!(testing_config.aggregation.deadline.is_some());

        let dev_config = FlotillaConfig::for_development();
        assert!(dev_config.runtime_mode.serves_demo_streams());
        assert_eq!(dev_config.aggregation.deadline, None);
    }
}
