//! In-memory authentication-credential cache
//!
//! One cache instance is shared by every job in the process. Reads are
//! concurrent; refresh is single-flight: when several callers observe an
//! expired credential at once, exactly one fetch happens and the rest await
//! its result.

use super::provider::{BearerCredential, CredentialProvider};
use crate::domain::Result;
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// Shared bearer-credential cache with guarded refresh
///
/// Lifecycle-managed: constructed once at coordinator setup, initialised on
/// first use, never persisted.
pub struct CredentialCache {
    provider: Arc<dyn CredentialProvider>,
    refresh_margin: Duration,
    current: RwLock<Option<BearerCredential>>,
    // Serializes refreshes; holders re-check freshness before fetching
    refresh_guard: Mutex<()>,
}

impl CredentialCache {
    /// Creates a cache backed by the given provider
    pub fn new(provider: Arc<dyn CredentialProvider>, refresh_margin: Duration) -> Self {
        Self {
            provider,
            refresh_margin,
            current: RwLock::new(None),
            refresh_guard: Mutex::new(()),
        }
    }

    /// Returns a valid bearer token, fetching or refreshing if needed
    ///
    /// # Errors
    ///
    /// Returns an error if no credential is cached and the provider cannot
    /// supply one.
    pub async fn bearer(&self) -> Result<String> {
        {
            let current = self.current.read().await;
            if let Some(ref credential) = *current {
                if !credential.is_expired(self.refresh_margin) {
                    return Ok(credential.token.expose_secret().to_string());
                }
            }
        }

        self.refresh_locked(Instant::now()).await
    }

    /// Forces a refresh after the registry reported credential expiry
    ///
    /// `observed_at` is the moment the caller captured before issuing the
    /// request that failed. If the cached credential is newer than that,
    /// another caller already refreshed and the current credential is
    /// returned without a second fetch.
    pub async fn refresh(&self, observed_at: Instant) -> Result<String> {
        self.refresh_locked(observed_at).await
    }

    async fn refresh_locked(&self, observed_at: Instant) -> Result<String> {
        let _guard = self.refresh_guard.lock().await;

        // Re-check under the guard: the refresh may already have happened
        // while this caller was waiting.
        {
            let current = self.current.read().await;
            if let Some(ref credential) = *current {
                if credential.fetched_at > observed_at
                    && !credential.is_expired(self.refresh_margin)
                {
                    return Ok(credential.token.expose_secret().to_string());
                }
            }
        }

        tracing::info!("Refreshing bearer credential");
        let credential = self.provider.fetch().await?;
        let token = credential.token.expose_secret().to_string();
        *self.current.write().await = Some(credential);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        fetches: AtomicUsize,
        lifetime: Option<Duration>,
    }

    impl CountingProvider {
        fn new(lifetime: Option<Duration>) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                lifetime,
            }
        }
    }

    #[async_trait]
    impl CredentialProvider for CountingProvider {
        async fn fetch(&self) -> Result<BearerCredential> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(BearerCredential::new(format!("tok-{n}"), self.lifetime))
        }
    }

    #[tokio::test]
    async fn test_first_use_fetches_once_then_reuses() {
        let provider = Arc::new(CountingProvider::new(Some(Duration::from_secs(3600))));
        let cache = CredentialCache::new(provider.clone(), Duration::from_secs(60));

        assert_eq!(cache.bearer().await.unwrap(), "tok-1");
        assert_eq!(cache.bearer().await.unwrap(), "tok-1");
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let provider = Arc::new(CountingProvider::new(Some(Duration::from_secs(3600))));
        let cache = Arc::new(CredentialCache::new(
            provider.clone(),
            Duration::from_secs(60),
        ));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.bearer().await.unwrap() }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), "tok-1");
        }

        assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_forced_refresh_is_single_flight() {
        let provider = Arc::new(CountingProvider::new(None));
        let cache = Arc::new(CredentialCache::new(
            provider.clone(),
            Duration::from_secs(60),
        ));

        // Seed the cache
        assert_eq!(cache.bearer().await.unwrap(), "tok-1");

        // Two callers observed expiry at the same moment; only one fetch
        // may result.
        let observed_at = Instant::now();
        let a = cache.refresh(observed_at).await.unwrap();
        let b = cache.refresh(observed_at).await.unwrap();

        assert_eq!(a, "tok-2");
        assert_eq!(b, "tok-2");
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_credential_triggers_refresh() {
        let provider = Arc::new(CountingProvider::new(Some(Duration::from_millis(0))));
        let cache = CredentialCache::new(provider.clone(), Duration::from_secs(0));

        // Zero lifetime: every bearer() call sees an expired credential
        assert_eq!(cache.bearer().await.unwrap(), "tok-1");
        assert_eq!(cache.bearer().await.unwrap(), "tok-2");
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 2);
    }
}
