//! Registry API trait definition
//!
//! This module defines the `RegistryApi` trait that abstracts the registry
//! transport. The production implementation speaks HTTP
//! ([`HttpRegistryClient`](super::client::HttpRegistryClient)); tests drive
//! the pipeline through in-memory fakes.

use crate::domain::Result;
use async_trait::async_trait;

use super::models::{BatchSubmitRequest, BatchSubmitResponse};

/// Transport interface to the immunisation registry
///
/// One call per wire request. Implementations return a parsed response for
/// any outcome the registry reported, and an error only when the request
/// itself failed (transport fault, authentication, malformed payload, or a
/// registry-side system error that warrants a retry of the whole request).
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Submits one batch of encounters
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be delivered or the
    /// registry reported a system fault for the whole request.
    async fn submit_batch(&self, request: &BatchSubmitRequest) -> Result<BatchSubmitResponse>;

    /// Submits a confirmation request for pended encounters
    ///
    /// The request must reuse the claim reference issued by the original
    /// submission.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be delivered or the
    /// registry reported a system fault for the whole request.
    async fn submit_confirmation(
        &self,
        request: &BatchSubmitRequest,
    ) -> Result<BatchSubmitResponse>;

    /// Checks that the registry is reachable and responding
    ///
    /// # Errors
    ///
    /// Returns an error if the registry is not reachable.
    async fn ping(&self) -> Result<()>;

    /// Base URL of the registry endpoint
    fn base_url(&self) -> &str;
}
