//! Which upstreams the addon talks to.

use serde::{Deserialize, Serialize};

/// Runtime mode, read from `FLOTILLA_MODE` or `--mode`.
///
/// Production builds providers from the declared upstreams and resolves ids
/// through TMDB. Development swaps in the demo line-up so the addon can be
/// installed and exercised offline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    /// Declared upstream providers
    #[default]
    #[value(alias = "prod")]
    Production,
    /// Demo providers with simulated latency
    #[value(alias = "dev")]
    Development,
}

impl RuntimeMode {
    /// Whether the registry should hold the demo line-up instead of the
    /// declared providers.
    pub fn serves_demo_streams(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Whether ids can be resolved from the built-in demo map when no TMDB
    /// key is configured.
    pub fn resolves_offline(self, has_tmdb_key: bool) -> bool {
        self.serves_demo_streams() && !has_tmdb_key
    }
}

impl std::fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Production => "production",
            Self::Development => "development",
        })
    }
}

impl std::str::FromStr for RuntimeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            other => Err(format!(
                "Unknown FLOTILLA_MODE '{other}', expected production or development"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_values_parse() {
        assert_eq!(" Dev ".parse::<RuntimeMode>(), Ok(RuntimeMode::Development));
        assert_eq!("prod".parse::<RuntimeMode>(), Ok(RuntimeMode::Production));
        assert!("staging".parse::<RuntimeMode>().is_err());
    }

    #[test]
    fn test_display_matches_env_value() {
        for mode in [RuntimeMode::Production, RuntimeMode::Development] {
            assert_eq!(mode.to_string().parse::<RuntimeMode>(), Ok(mode));
        }
    }

    #[test]
    fn test_offline_resolution_only_without_key_in_development() {
        assert!(RuntimeMode::Development.resolves_offline(false));
        assert!(!RuntimeMode::Development.resolves_offline(true));
        assert!(!RuntimeMode::Production.resolves_offline(false));
        assert!(!RuntimeMode::Production.serves_demo_streams());
    }
}
