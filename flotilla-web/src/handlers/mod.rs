//! HTTP request handlers organized by functionality

pub mod api;
pub mod manifest;
pub mod stream;

// Re-export handler functions
pub use api::{HealthReport, aggregate_outcome, health};
pub use manifest::{configured_manifest, manifest};
pub use stream::{configured_streams, streams};
