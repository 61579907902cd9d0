//! Scriptable provider for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::SourceProvider;
use crate::coerce::candidates_from_value;
use crate::errors::ProviderError;
use crate::types::{Candidate, MediaReference};

/// What a stub provider answers with.
#[derive(Debug, Clone)]
pub enum StubResponse {
    /// Succeed with these candidates
    Candidates(Vec<Candidate>),
    /// Fail with `ProviderError::Failed(message)`
    Error(String),
    /// Run a raw upstream value through candidate coercion
    Raw(Value),
    /// Panic inside the invocation
    Panic,
    /// Never settle
    Hang,
}

/// Provider with scripted latency and response that counts its invocations.
#[derive(Debug, Clone)]
pub struct StubProvider {
    name: String,
    delay: Duration,
    response: StubResponse,
    invocations: Arc<AtomicUsize>,
}

impl StubProvider {
    /// Creates a stub with the given response and no delay.
    pub fn new(name: impl Into<String>, response: StubResponse) -> Self {
        Self {
            name: name.into(),
            delay: Duration::ZERO,
            response,
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Stub that succeeds with `candidates`.
    pub fn returning(name: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self::new(name, StubResponse::Candidates(candidates))
    }

    /// Stub that fails with `message`.
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, StubResponse::Error(message.into()))
    }

    /// Stub whose upstream produced `value`.
    pub fn raw(name: impl Into<String>, value: Value) -> Self {
        Self::new(name, StubResponse::Raw(value))
    }

    /// Stub that panics.
    pub fn panicking(name: impl Into<String>) -> Self {
        Self::new(name, StubResponse::Panic)
    }

    /// Stub that never settles.
    pub fn hanging(name: impl Into<String>) -> Self {
        Self::new(name, StubResponse::Hang)
    }

    /// Adds latency before the response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Shared invocation counter, readable after the stub moved into a registry.
    pub fn invocation_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.invocations)
    }

    /// Number of times `invoke` was called.
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceProvider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, _media: &MediaReference) -> Result<Vec<Candidate>, ProviderError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.response {
            StubResponse::Candidates(candidates) => Ok(candidates.clone()),
            StubResponse::Error(message) => Err(ProviderError::Failed(message.clone())),
            StubResponse::Raw(value) => candidates_from_value(value.clone()),
            StubResponse::Panic => panic!("stub provider '{}' panicked", self.name),
            StubResponse::Hang => std::future::pending().await,
        }
    }
}
