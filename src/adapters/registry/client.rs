//! HTTP registry client
//!
//! Production implementation of [`RegistryApi`] over the registry's REST
//! endpoints. Handles bearer authentication (with a single refresh-and-
//! retry on credential expiry), maps transport failures into domain errors,
//! and surfaces registry-side system faults as retryable errors.

use crate::adapters::auth::CredentialCache;
use crate::adapters::registry::codes;
use crate::config::RegistryConfig;
use crate::domain::{RegistryError, Result, VaxflowError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::api::RegistryApi;
use super::models::{BatchSubmitRequest, BatchSubmitResponse};

/// HTTP implementation of the registry transport
pub struct HttpRegistryClient {
    base_url: String,
    client: Client,
    credentials: Arc<CredentialCache>,
}

impl HttpRegistryClient {
    /// Creates a new client from the registry configuration
    pub fn new(config: &RegistryConfig, credentials: Arc<CredentialCache>) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));

        if !config.tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| VaxflowError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            credentials,
        })
    }

    /// Posts a request body, refreshing the credential once on expiry
    ///
    /// The refresh-and-retry happens here, outside the batch retry budget:
    /// an expired credential is not a batch failure.
    async fn post_claims(&self, path: &str, request: &BatchSubmitRequest) -> Result<BatchSubmitResponse> {
        let url = format!("{}{}", self.base_url, path);

        let observed_at = Instant::now();
        let bearer = self.credentials.bearer().await?;
        let response = self.send(&url, &bearer, request).await?;

        let response = if response.status() == StatusCode::UNAUTHORIZED {
            tracing::info!("Registry reported credential expiry, refreshing once");
            let bearer = self.credentials.refresh(observed_at).await?;
            let retried = self.send(&url, &bearer, request).await?;
            if retried.status() == StatusCode::UNAUTHORIZED {
                let body = retried.text().await.unwrap_or_default();
                return Err(RegistryError::AuthExpired(format!(
                    "credential rejected after refresh: {body}"
                ))
                .into());
            }
            retried
        } else {
            response
        };

        let status = response.status();
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::ServerError {
                status: status.as_u16(),
                message: body,
            }
            .into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::ClientError {
                status: status.as_u16(),
                message: body,
            }
            .into());
        }

        let parsed: BatchSubmitResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::Protocol(format!("malformed registry response: {e}")))?;

        // An explicit system-error code at batch level means the registry
        // could not process the request; retry the whole batch.
        if codes::is_system_error(&parsed.status_code) {
            return Err(RegistryError::SystemError {
                code: parsed.status_code.clone(),
                message: parsed.message.clone().unwrap_or_default(),
            }
            .into());
        }

        Ok(parsed)
    }

    async fn send(
        &self,
        url: &str,
        bearer: &str,
        request: &BatchSubmitRequest,
    ) -> Result<reqwest::Response> {
        self.client
            .post(url)
            .header("Authorization", format!("Bearer {bearer}"))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RegistryError::Timeout(e.to_string()).into()
                } else {
                    RegistryError::ConnectionFailed(e.to_string()).into()
                }
            })
    }
}

#[async_trait]
impl RegistryApi for HttpRegistryClient {
    async fn submit_batch(&self, request: &BatchSubmitRequest) -> Result<BatchSubmitResponse> {
        tracing::debug!(
            message_id = %request.message_id,
            encounters = request.encounters.len(),
            "Submitting batch to registry"
        );
        self.post_claims("/claims/batch", request).await
    }

    async fn submit_confirmation(
        &self,
        request: &BatchSubmitRequest,
    ) -> Result<BatchSubmitResponse> {
        tracing::debug!(
            message_id = %request.message_id,
            "Submitting confirmation to registry"
        );
        self.post_claims("/claims/confirm", request).await
    }

    async fn ping(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                RegistryError::Timeout(e.to_string())
            } else {
                RegistryError::ConnectionFailed(e.to_string())
            }
        })?;

        if response.status().is_success() {
            tracing::info!(base_url = %self.base_url, "Registry health check passed");
            Ok(())
        } else {
            Err(RegistryError::ServerError {
                status: response.status().as_u16(),
                message: "health check failed".to_string(),
            }
            .into())
        }
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::{BearerCredential, CredentialProvider};
    use crate::domain::ids::ProviderId;
    use crate::domain::record::test_support::record;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProvider {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl CredentialProvider for FakeProvider {
        async fn fetch(&self) -> Result<BearerCredential> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(BearerCredential::new(format!("tok-{n}"), None))
        }
    }

    fn client_for(server: &mockito::ServerGuard) -> (HttpRegistryClient, Arc<FakeProvider>) {
        let provider = Arc::new(FakeProvider {
            fetches: AtomicUsize::new(0),
        });
        let cache = Arc::new(CredentialCache::new(
            provider.clone(),
            Duration::from_secs(60),
        ));
        let config = RegistryConfig {
            base_url: server.url(),
            tls_verify: true,
            timeout_seconds: 5,
            retry: Default::default(),
        };
        (HttpRegistryClient::new(&config, cache).unwrap(), provider)
    }

    fn single_request() -> BatchSubmitRequest {
        let provider = ProviderId::new("2447051W").unwrap();
        BatchSubmitRequest::for_single(&record(1, "Amy", "2025-06-01"), &provider, "corr-1")
    }

    #[tokio::test]
    async fn test_submit_batch_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/claims/batch")
            .match_header("authorization", "Bearer tok-1")
            .with_status(200)
            .with_body(
                r#"{"statusCode": "AIR-S-0000", "encounters": [
                    {"id": 1, "episodes": [
                        {"id": 1, "statusCode": "AIR-S-0000", "message": "Accepted."}
                    ]}
                ]}"#,
            )
            .create_async()
            .await;

        let (client, _) = client_for(&server);
        let response = client.submit_batch(&single_request()).await.unwrap();

        assert_eq!(response.status_code, "AIR-S-0000");
        assert_eq!(response.encounters.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_maps_to_retryable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/claims/batch")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let (client, _) = client_for(&server);
        let err = client.submit_batch(&single_request()).await.unwrap_err();

        match err {
            VaxflowError::Registry(e) => {
                assert!(e.is_retryable());
                assert!(matches!(e, RegistryError::ServerError { status: 503, .. }));
            }
            other => panic!("expected registry error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_system_error_code_maps_to_retryable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/claims/batch")
            .with_status(200)
            .with_body(r#"{"statusCode": "AIR-E-9000", "message": "Internal fault.", "encounters": []}"#)
            .create_async()
            .await;

        let (client, _) = client_for(&server);
        let err = client.submit_batch(&single_request()).await.unwrap_err();

        match err {
            VaxflowError::Registry(RegistryError::SystemError { code, message }) => {
                assert_eq!(code, "AIR-E-9000");
                assert_eq!(message, "Internal fault.");
            }
            other => panic!("expected system error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_client_error_not_retryable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/claims/batch")
            .with_status(400)
            .with_body("bad request")
            .create_async()
            .await;

        let (client, _) = client_for(&server);
        let err = client.submit_batch(&single_request()).await.unwrap_err();

        match err {
            VaxflowError::Registry(e) => assert!(!e.is_retryable()),
            other => panic!("expected registry error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_expired_credential_refreshed_exactly_once() {
        let mut server = mockito::Server::new_async().await;
        // First attempt with the stale token is rejected
        server
            .mock("POST", "/claims/batch")
            .match_header("authorization", "Bearer tok-1")
            .with_status(401)
            .create_async()
            .await;
        // Retry with the refreshed token succeeds
        let retried = server
            .mock("POST", "/claims/batch")
            .match_header("authorization", "Bearer tok-2")
            .with_status(200)
            .with_body(r#"{"statusCode": "AIR-S-0000", "encounters": []}"#)
            .create_async()
            .await;

        let (client, provider) = client_for(&server);
        let response = client.submit_batch(&single_request()).await.unwrap();

        assert_eq!(response.status_code, "AIR-S-0000");
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 2);
        retried.assert_async().await;
    }

    #[tokio::test]
    async fn test_still_unauthorized_after_refresh_surfaces_auth_expired() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/claims/batch")
            .with_status(401)
            .expect(2)
            .create_async()
            .await;

        let (client, _) = client_for(&server);
        let err = client.submit_batch(&single_request()).await.unwrap_err();

        match err {
            VaxflowError::Registry(e) => assert!(e.is_auth_expiry()),
            other => panic!("expected auth expiry, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_response_is_protocol_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/claims/batch")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let (client, _) = client_for(&server);
        let err = client.submit_batch(&single_request()).await.unwrap_err();

        match err {
            VaxflowError::Registry(e) => {
                assert!(matches!(e, RegistryError::Protocol(_)));
                assert!(!e.is_retryable());
            }
            other => panic!("expected protocol error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_ping() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(200)
            .create_async()
            .await;

        let (client, _) = client_for(&server);
        assert!(client.ping().await.is_ok());
    }
}
