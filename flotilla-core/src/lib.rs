//! Flotilla Core - Shared plumbing for the stream aggregation addon
//!
//! This crate provides the pieces every other Flotilla crate leans on:
//! centralized configuration, runtime mode selection, tracing setup and the
//! shared outbound HTTP client.

pub mod config;
pub mod http;
pub mod mode;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::FlotillaConfig;
pub use mode::RuntimeMode;

/// Core errors that can bubble up from process-level Flotilla operations.
///
/// Provider and aggregation failures never surface here; they are absorbed
/// into the per-provider status of an aggregation outcome.
#[derive(Debug, thiserror::Error)]
pub enum FlotillaError {
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("HTTP client error: {reason}")]
    HttpClient { reason: String },

    #[error("Server error: {reason}")]
    Server { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlotillaError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            FlotillaError::Configuration { reason } => format!("Invalid configuration: {reason}"),
            FlotillaError::HttpClient { .. } => "Could not initialize HTTP client".to_string(),
            FlotillaError::Server { reason } => format!("Addon server failed: {reason}"),
            FlotillaError::Io(_) => "File system or socket error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        matches!(self, FlotillaError::Configuration { .. })
    }
}

pub type Result<T> = std::result::Result<T, FlotillaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_classification() {
        let config_error = FlotillaError::Configuration {
            reason: "bad port".to_string(),
        };
        assert!(config_error.is_user_error());
        assert_eq!(config_error.user_message(), "Invalid configuration: bad port");

        let server_error = FlotillaError::Server {
            reason: "address in use".to_string(),
        };
        assert!(!server_error.is_user_error());
    }
}
