//! Shared outbound HTTP client
//!
//! The resolver and every network-backed provider share one `reqwest::Client`
//! so connection pools and the configured timeout apply across the process.

use crate::FlotillaError;
use crate::config::NetworkConfig;

/// Builds the shared HTTP client from network configuration.
///
/// # Errors
///
/// - `FlotillaError::HttpClient` - If the TLS backend or client builder fails
pub fn build_http_client(config: &NetworkConfig) -> Result<reqwest::Client, FlotillaError> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .build()
        .map_err(|e| FlotillaError::HttpClient {
            reason: e.to_string(),
        })
}

/// Renders a request error as a short, log-friendly reason.
pub fn describe_request_error(error: &reqwest::Error, url: &str) -> String {
    if error.is_timeout() {
        format!("Request timed out: {url}")
    } else if error.is_connect() {
        format!("Failed to connect: {url}")
    } else if error.is_decode() {
        format!("Undecodable response body from {url}")
    } else if error.is_request() {
        format!("Invalid request: {url}")
    } else {
        format!("HTTP request failed: {error}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_from_defaults() {
        let client = build_http_client(&NetworkConfig::default()).unwrap();
        assert!(client.get("http://example.com").build().is_ok());
    }
}
