//! Credential provider seam
//!
//! Token acquisition mechanics are outside the pipeline's scope; the
//! pipeline only needs "a valid bearer credential". This module defines the
//! [`CredentialProvider`] trait that abstracts where credentials come from,
//! plus the default OAuth client-credentials implementation.

use crate::config::AuthConfig;
use crate::config::{secret_string, SecretString};
use crate::domain::{RegistryError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// A bearer credential with its expiry bookkeeping
#[derive(Clone, Debug)]
pub struct BearerCredential {
    /// The bearer token value
    /// Stored securely in memory and automatically zeroized on drop
    pub token: SecretString,

    /// When the credential was obtained
    pub fetched_at: Instant,

    /// Nominal lifetime reported by the issuer, if any
    pub expires_in: Option<Duration>,
}

impl BearerCredential {
    /// Creates a credential fetched now
    pub fn new(token: impl Into<String>, expires_in: Option<Duration>) -> Self {
        Self {
            token: secret_string(token.into()),
            fetched_at: Instant::now(),
            expires_in,
        }
    }

    /// Whether the credential should be treated as expired
    ///
    /// `margin` widens the window so refresh happens before the registry
    /// starts rejecting the token. Credentials without a reported lifetime
    /// never expire locally; the registry's auth-expiry response handles
    /// them.
    pub fn is_expired(&self, margin: Duration) -> bool {
        match self.expires_in {
            Some(lifetime) => self.fetched_at.elapsed() + margin >= lifetime,
            None => false,
        }
    }
}

/// Source of bearer credentials for registry requests
///
/// Implementations fetch a fresh credential on demand. Callers go through
/// the [`CredentialCache`](super::cache::CredentialCache), which handles
/// reuse and single-flight refresh; providers only ever see one fetch at a
/// time.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Obtain a fresh bearer credential
    ///
    /// # Errors
    ///
    /// Returns an error if the credential cannot be obtained.
    async fn fetch(&self) -> Result<BearerCredential>;
}

/// OAuth client-credentials token provider
///
/// Exchanges the configured client id/secret for a bearer token at the
/// token endpoint, authenticating the token request itself with HTTP Basic.
pub struct OAuthCredentialProvider {
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl OAuthCredentialProvider {
    /// Creates a provider from the auth configuration
    ///
    /// `registry_base_url` supplies the default token endpoint when
    /// `auth.token_url` is not configured.
    pub fn new(
        config: &AuthConfig,
        registry_base_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let token_url = config
            .token_url
            .clone()
            .unwrap_or_else(|| format!("{}/oauth/token", registry_base_url.trim_end_matches('/')));

        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| RegistryError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            token_url,
            client_id: config.client_id.clone(),
            client_secret: secret_string(config.client_secret.expose_secret().to_string()),
            client,
        })
    }

    fn basic_auth_header(&self) -> String {
        let credentials = format!(
            "{}:{}",
            self.client_id,
            self.client_secret.expose_secret()
        );
        let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
        format!("Basic {encoded}")
    }
}

#[async_trait]
impl CredentialProvider for OAuthCredentialProvider {
    async fn fetch(&self) -> Result<BearerCredential> {
        tracing::debug!(token_url = %self.token_url, "Fetching bearer credential");

        let response = self
            .client
            .post(&self.token_url)
            .header("Authorization", self.basic_auth_header())
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RegistryError::Timeout(e.to_string())
                } else {
                    RegistryError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::AuthenticationFailed(format!(
                "token endpoint rejected client credentials: {body}"
            ))
            .into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::ServerError {
                status: status.as_u16(),
                message: format!("token endpoint failed: {body}"),
            }
            .into());
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::Protocol(format!("malformed token response: {e}")))?;

        tracing::info!(
            expires_in = ?token.expires_in,
            "Obtained bearer credential"
        );

        Ok(BearerCredential::new(
            token.access_token,
            token.expires_in.map(Duration::from_secs),
        ))
    }
}
