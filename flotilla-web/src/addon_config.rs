//! Parsing of the user configuration path segment.
//!
//! Stremio installs a configured addon under `/{config}/manifest.json` and
//! repeats the segment on every resource call. Flotilla understands
//! `providers=a,b` (optionally url-encoded); other keys are ignored.

use std::borrow::Cow;

use flotilla_search::ProviderSelection;

/// Settings carried in the configuration path segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddonConfig {
    /// Providers the user enabled, `None` for all of them
    pub selection: Option<ProviderSelection>,
}

impl AddonConfig {
    /// Parses a configuration segment. Never fails; unknown content is ignored.
    pub fn parse(segment: &str) -> Self {
        let decoded = urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment));

        let selection = decoded
            .split(['&', '|'])
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| key.trim() == "providers")
            .map(|(_, value)| ProviderSelection::parse(value))
            .filter(|selection| !selection.is_empty());

        Self { selection }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_provider_list() {
        let config = AddonConfig::parse("providers=alpha,beta");
        let names: Vec<&str> = config.selection.as_ref().unwrap().names().collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_parses_encoded_segment() {
        let config = AddonConfig::parse("providers%3Dalpha%2Cbeta%26theme%3Ddark");
        let selection = config.selection.unwrap();
        assert!(selection.admits("alpha"));
        assert!(!selection.admits("gamma"));
    }

    #[test]
    fn test_unknown_or_empty_config_selects_everything() {
        assert_eq!(AddonConfig::parse("theme=dark").selection, None);
        assert_eq!(AddonConfig::parse("providers=").selection, None);
        assert_eq!(AddonConfig::parse("garbage").selection, None);
    }
}
