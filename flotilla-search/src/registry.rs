//! Startup-time registry of source providers and per-user selection.

use std::collections::BTreeSet;
use std::sync::Arc;

use flotilla_core::FlotillaConfig;

use crate::errors::RegistryError;
use crate::providers::{DevelopmentProvider, EmbedPageProvider, JsonApiProvider, SourceProvider};

/// Set of provider names a user enabled.
///
/// An empty selection means "every registered provider".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderSelection {
    names: BTreeSet<String>,
}

impl ProviderSelection {
    /// Parses a comma-separated list of provider names.
    pub fn parse(raw: &str) -> Self {
        Self::from_names(raw.split(','))
    }

    /// Builds a selection from names, ignoring blanks.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|name| name.as_ref().trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    /// Whether no provider was named.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether the selection admits the provider `name`.
    pub fn admits(&self, name: &str) -> bool {
        self.names.is_empty() || self.names.contains(name)
    }

    /// Selected names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Providers known to this process, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn SourceProvider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the registry for the configured runtime mode.
    ///
    /// Development mode registers the demo line-up; production mode registers
    /// every declared JSON and embed provider.
    ///
    /// # Errors
    /// - `RegistryError::DuplicateProvider` - Two declarations share a name
    /// - `RegistryError::InvalidProvider` - A declaration could not be built
    pub fn from_config(
        config: &FlotillaConfig,
        client: &reqwest::Client,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();

        if config.runtime_mode.serves_demo_streams() {
            for provider in DevelopmentProvider::lineup() {
                registry.register(Arc::new(provider))?;
            }
            return Ok(registry);
        }

        for spec in &config.providers.json {
            registry.register(Arc::new(JsonApiProvider::new(client.clone(), spec)))?;
        }

        for spec in &config.providers.embed {
            let provider =
                EmbedPageProvider::new(client.clone(), spec, config.providers.domain_ttl)?;
            registry.register(Arc::new(provider))?;
        }

        if registry.is_empty() {
            tracing::warn!("No source providers declared; every request will return no streams");
        }

        Ok(registry)
    }

    /// Adds a provider.
    ///
    /// # Errors
    /// - `RegistryError::DuplicateProvider` - A provider with the same name exists
    pub fn register(&mut self, provider: Arc<dyn SourceProvider>) -> Result<(), RegistryError> {
        if self.get(provider.name()).is_some() {
            return Err(RegistryError::DuplicateProvider {
                name: provider.name().to_string(),
            });
        }
        tracing::debug!(provider = provider.name(), "Registered source provider");
        self.providers.push(provider);
        Ok(())
    }

    /// Looks a provider up by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn SourceProvider>> {
        self.providers.iter().find(|provider| provider.name() == name)
    }

    /// Providers admitted by `selection`, in registration order.
    ///
    /// Names in the selection that are not registered are ignored.
    pub fn select(&self, selection: Option<&ProviderSelection>) -> Vec<Arc<dyn SourceProvider>> {
        self.providers
            .iter()
            .filter(|provider| selection.is_none_or(|selection| selection.admits(provider.name())))
            .cloned()
            .collect()
    }

    /// Names of every registered provider.
    pub fn names(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|provider| provider.name().to_string())
            .collect()
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no provider is registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use flotilla_core::config::{EmbedProviderSpec, JsonProviderSpec};

    use super::*;
    use crate::providers::StubProvider;

    fn registry_of(names: &[&str]) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        for name in names {
            registry
                .register(Arc::new(StubProvider::returning(*name, Vec::new())))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let mut registry = registry_of(&["alpha"]);
        let result = registry.register(Arc::new(StubProvider::returning("alpha", Vec::new())));
        assert_eq!(
            result,
            Err(RegistryError::DuplicateProvider {
                name: "alpha".to_string()
            })
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_select_keeps_registration_order() {
        let registry = registry_of(&["gamma", "alpha", "beta"]);
        let selection = ProviderSelection::parse("beta, gamma,unknown");

        let names: Vec<String> = registry
            .select(Some(&selection))
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["gamma", "beta"]);
    }

    #[test]
    fn test_empty_selection_admits_everything() {
        let registry = registry_of(&["alpha", "beta"]);
        assert_eq!(registry.select(None).len(), 2);
        assert_eq!(registry.select(Some(&ProviderSelection::parse(" , "))).len(), 2);
    }

    #[test]
    fn test_development_registry() {
        let registry =
            ProviderRegistry::from_config(&FlotillaConfig::for_development(), &reqwest::Client::new())
                .unwrap();
        assert_eq!(registry.len(), DevelopmentProvider::lineup().len());
        assert!(registry.get("demo-harbor").is_some());
    }

    #[test]
    fn test_production_registry_from_declarations() {
        let mut config = FlotillaConfig::default();
        config.providers.json.push(JsonProviderSpec {
            name: "api".to_string(),
            movie_template: "http://api/{id}".to_string(),
            series_template: None,
            list_pointer: None,
        });
        config.providers.embed.push(EmbedProviderSpec {
            name: "mirror".to_string(),
            domain_source_url: "http://domains/latest".to_string(),
            movie_path: "/embed/{id}".to_string(),
            series_path: None,
        });

        let registry = ProviderRegistry::from_config(&config, &reqwest::Client::new()).unwrap();
        assert_eq!(registry.names(), vec!["api", "mirror"]);
    }

    #[test]
    fn test_production_registry_rejects_duplicates() {
        let mut config = FlotillaConfig::default();
        let spec = JsonProviderSpec {
            name: "api".to_string(),
            movie_template: "http://api/{id}".to_string(),
            series_template: None,
            list_pointer: None,
        };
        config.providers.json = vec![spec.clone(), spec];

        let result = ProviderRegistry::from_config(&config, &reqwest::Client::new());
        assert!(matches!(result, Err(RegistryError::DuplicateProvider { .. })));
    }
}
