//! Error types for provider invocation, id resolution and registry setup.

use thiserror::Error;

use crate::types::FailureKind;

/// Errors a source provider can fail an invocation with.
///
/// The aggregator never propagates these; it records the `Display` text as the
/// provider's error summary.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network communication with the upstream failed.
    #[error("Network error: {reason}")]
    Network {
        /// The reason for the network error
        reason: String,
    },

    /// Upstream answered with a non-success HTTP status.
    #[error("Upstream returned HTTP {status}")]
    Upstream {
        /// HTTP status code returned by the upstream
        status: u16,
    },

    /// Upstream response could not be parsed.
    #[error("Parse error: {reason}")]
    Parse {
        /// The reason for the parse error
        reason: String,
    },

    /// Upstream produced something that is not a list of well-formed candidates.
    #[error("invalid result shape")]
    InvalidShape {
        /// What exactly was malformed, for logs
        detail: String,
    },

    /// Any other provider-specific failure, summarized by its message.
    #[error("{0}")]
    Failed(String),
}

impl ProviderError {
    /// Classifies this error for the per-provider status entry.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ProviderError::InvalidShape { .. } => FailureKind::InvalidShape,
            _ => FailureKind::Failure,
        }
    }
}

/// Errors raised while translating an external id into an internal one.
///
/// A missing mapping is not an error; resolvers return `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// External ids need an API key that was not configured.
    #[error("TMDB API key is not configured; cannot resolve '{external_id}'")]
    MissingApiKey {
        /// The id that could not be resolved
        external_id: String,
    },

    /// Network communication with the resolution service failed.
    #[error("Network error: {reason}")]
    Network {
        /// The reason for the network error
        reason: String,
    },

    /// Resolution service answered with a non-success HTTP status.
    #[error("Resolution service returned HTTP {status}")]
    Upstream {
        /// HTTP status code
        status: u16,
    },

    /// Resolution service response could not be parsed.
    #[error("Parse error: {reason}")]
    Parse {
        /// The reason for the parse error
        reason: String,
    },
}

/// Errors raised while parsing an inbound media identifier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaIdError {
    /// The content type is neither `movie` nor `series`.
    #[error("Unsupported media type: {media_type}")]
    UnsupportedType {
        /// The type string that was received
        media_type: String,
    },

    /// The identifier scheme is not understood.
    #[error("Unsupported media id: {id}")]
    UnsupportedId {
        /// The id that was received
        id: String,
    },

    /// Season or episode is not a positive integer.
    #[error("Invalid {field} '{value}' in media id")]
    InvalidCoordinate {
        /// Either `season` or `episode`
        field: &'static str,
        /// The offending value
        value: String,
    },

    /// A film id carried episode coordinates.
    #[error("Film id '{id}' must not carry season or episode")]
    UnexpectedCoordinates {
        /// The id that was received
        id: String,
    },
}

/// Errors raised while building the provider registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two providers share a name.
    #[error("Provider '{name}' is already registered")]
    DuplicateProvider {
        /// The duplicated provider name
        name: String,
    },

    /// A provider declaration could not be turned into a provider.
    #[error("Invalid provider '{name}': {reason}")]
    InvalidProvider {
        /// The provider name
        name: String,
        /// Why it was rejected
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_summaries() {
        assert_eq!(ProviderError::Failed("timeout".to_string()).to_string(), "timeout");
        assert_eq!(
            ProviderError::InvalidShape {
                detail: "expected array, got null".to_string()
            }
            .to_string(),
            "invalid result shape"
        );
        assert_eq!(
            ProviderError::Upstream { status: 503 }.to_string(),
            "Upstream returned HTTP 503"
        );
    }

    #[test]
    fn test_failure_kind_classification() {
        let shape = ProviderError::InvalidShape {
            detail: String::new(),
        };
        assert_eq!(shape.failure_kind(), FailureKind::InvalidShape);

        let network = ProviderError::Network {
            reason: "refused".to_string(),
        };
        assert_eq!(network.failure_kind(), FailureKind::Failure);
    }
}
