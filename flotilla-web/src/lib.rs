//! Flotilla Web - Stremio addon server

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
//!
//! Serves the addon manifest and stream resources over HTTP, plus a couple of
//! JSON endpoints for operators.

pub mod addon_config;
pub mod errors;
pub mod handlers;
pub mod server;
pub mod stremio;

// Re-export main types
pub use addon_config::AddonConfig;
pub use errors::WebError;
pub use server::{AppState, router, run_server};
