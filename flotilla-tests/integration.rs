//! Integration tests for Flotilla
//!
//! These tests exercise the aggregator, the stream service and the addon
//! server together, using scripted providers and local fixture upstreams.

#[path = "integration/aggregation_properties.rs"]
mod aggregation_properties;

#[path = "integration/concurrency.rs"]
mod concurrency;

#[path = "integration/end_to_end_scenario.rs"]
mod end_to_end_scenario;

#[path = "integration/upstream_providers.rs"]
mod upstream_providers;

#[path = "integration/addon_http.rs"]
mod addon_http;
