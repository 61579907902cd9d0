//! Flotilla Search - Stream source providers and concurrent aggregation

#![warn(missing_docs)]
#![deny(clippy::missing_errors_doc)]
#![warn(clippy::too_many_lines)]
//!
//! Resolves Stremio media ids, fans a request out to every enabled source
//! provider at once and merges whatever they return, recording a status for
//! each provider.

pub mod aggregator;
pub mod coerce;
pub mod errors;
pub mod media_id;
pub mod providers;
pub mod quality;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod types;

// Re-export main types
pub use aggregator::Aggregator;
pub use errors::{MediaIdError, ProviderError, RegistryError, ResolveError};
pub use media_id::parse_media_id;
pub use providers::SourceProvider;
pub use registry::{ProviderRegistry, ProviderSelection};
pub use resolver::{MediaResolver, StaticResolver, TmdbResolver};
pub use service::StreamService;
pub use types::{
    AggregationOutcome, Candidate, FailureKind, MediaKind, MediaReference, ProviderStatus,
};
