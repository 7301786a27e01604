// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Behaviour
//!
//! - The key set for an issuer is fetched lazily from
//!   `<issuer>/.well-known/jwks.json` on first verification
//! - Entries live for the configured TTL (or the whole process when the TTL
//!   is `None`)
//! - At most one fetch is in flight; callers that queued behind it share
//!   its result, failures included
//! - Stale cache is used on fetch failure
//! - A token naming an unknown `kid` may trigger an early re-fetch, rate
//!   limited by a cooldown, so rotated keys are picked up without a restart

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::JwkSet;
use tokio::sync::{Mutex, RwLock};

use super::error::AuthError;

/// Default JWKS cache TTL (1 hour).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Minimum age of a cached key set before an unknown `kid` may force a re-fetch.
pub const DEFAULT_REFETCH_COOLDOWN: Duration = Duration::from_secs(30);

/// Well-known path of the key set, relative to the issuer URL.
const JWKS_PATH: &str = "/.well-known/jwks.json";

/// JWKS cache entry.
struct CacheEntry {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Issuer key-set cache.
///
/// Shared between requests behind an `Arc`; the cached handle is an
/// `Arc<JwkSet>`, so repeated lookups of a fresh entry return the same
/// allocation.
pub struct KeySetCache {
    /// Cache TTL (`None` = never expires)
    cache_ttl: Option<Duration>,
    /// Cooldown for `kid`-miss re-fetches
    refetch_cooldown: Duration,
    /// Cached key sets keyed by issuer URL
    cache: RwLock<HashMap<String, CacheEntry>>,
    /// Held for the duration of every network fetch. Guards the time of the
    /// last failed fetch per issuer.
    fetch_lock: Mutex<HashMap<String, Instant>>,
    /// HTTP client
    client: reqwest::Client,
}

impl KeySetCache {
    /// Create a cache with the default TTL and cooldown.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to build JWKS HTTP client, using defaults");
                reqwest::Client::new()
            });

        Self {
            cache_ttl: Some(DEFAULT_CACHE_TTL),
            refetch_cooldown: DEFAULT_REFETCH_COOLDOWN,
            cache: RwLock::new(HashMap::new()),
            fetch_lock: Mutex::new(HashMap::new()),
            client,
        }
    }

    /// Set the cache TTL. `None` keeps key sets for the process lifetime.
    pub fn with_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the minimum age before a `kid` miss may re-fetch the key set.
    pub fn with_refetch_cooldown(mut self, cooldown: Duration) -> Self {
        self.refetch_cooldown = cooldown;
        self
    }

    /// JWKS URL published by `issuer`.
    pub fn jwks_url(issuer: &str) -> String {
        format!("{}{JWKS_PATH}", issuer.trim_end_matches('/'))
    }

    /// Return the cached key set for `issuer`, fetching it if absent or stale.
    ///
    /// When the fetch fails and an expired entry exists, the expired keys are
    /// returned.
    pub async fn get_or_fetch(&self, issuer: &str) -> Result<Arc<JwkSet>, AuthError> {
        if let Some(keys) = self.fresh(issuer).await {
            return Ok(keys);
        }

        let waiting_since = Instant::now();
        let mut failures = self.fetch_lock.lock().await;

        // Populated by whoever held the lock before us
        if let Some(keys) = self.fresh(issuer).await {
            return Ok(keys);
        }

        // The fetch we queued behind failed; share its outcome
        if failures
            .get(issuer)
            .is_some_and(|failed_at| *failed_at >= waiting_since)
        {
            return self.stale_or(issuer, AuthError::InvalidToken).await;
        }

        match self.fetch_and_store(issuer).await {
            Ok(keys) => {
                failures.remove(issuer);
                Ok(keys)
            }
            Err(e) => {
                failures.insert(issuer.to_string(), Instant::now());
                self.stale_or(issuer, e).await
            }
        }
    }

    /// Re-fetch the key set unless the cached copy is younger than the cooldown.
    ///
    /// Called when a token names a `kid` the cached set does not contain.
    pub async fn refetch_if_stale(&self, issuer: &str) -> Result<Arc<JwkSet>, AuthError> {
        let _fetching = self.fetch_lock.lock().await;

        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(issuer) {
                if entry.fetched_at.elapsed() < self.refetch_cooldown {
                    return Ok(entry.keys.clone());
                }
            }
        }

        tracing::info!(issuer = %issuer, "Unknown signing key id, re-fetching JWKS");
        self.fetch_and_store(issuer).await
    }

    /// Drop every cached key set.
    pub async fn reset(&self) {
        self.cache.write().await.clear();
    }

    /// Check if a fresh key set is cached for `issuer`.
    pub async fn is_cached(&self, issuer: &str) -> bool {
        self.fresh(issuer).await.is_some()
    }

    /// Expired keys for `issuer` if any were ever fetched, otherwise `error`.
    async fn stale_or(&self, issuer: &str, error: AuthError) -> Result<Arc<JwkSet>, AuthError> {
        let cache = self.cache.read().await;
        match cache.get(issuer) {
            Some(entry) => {
                tracing::warn!(
                    issuer = %issuer,
                    age_secs = entry.fetched_at.elapsed().as_secs(),
                    "JWKS fetch failed, using stale key set"
                );
                Ok(entry.keys.clone())
            }
            None => Err(error),
        }
    }

    async fn fresh(&self, issuer: &str) -> Option<Arc<JwkSet>> {
        let cache = self.cache.read().await;
        cache
            .get(issuer)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.keys.clone())
    }

    fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.cache_ttl
            .map_or(true, |ttl| entry.fetched_at.elapsed() < ttl)
    }

    async fn fetch_and_store(&self, issuer: &str) -> Result<Arc<JwkSet>, AuthError> {
        let keys = Arc::new(self.fetch(issuer).await?);

        tracing::info!(issuer = %issuer, key_count = keys.keys.len(), "JWKS cache refreshed");

        let mut cache = self.cache.write().await;
        cache.insert(
            issuer.to_string(),
            CacheEntry {
                keys: keys.clone(),
                fetched_at: Instant::now(),
            },
        );

        Ok(keys)
    }

    /// Fetch JWKS from the issuer.
    async fn fetch(&self, issuer: &str) -> Result<JwkSet, AuthError> {
        let url = Self::jwks_url(issuer);
        tracing::debug!(url = %url, "Fetching JWKS");

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "Failed to fetch JWKS");
            AuthError::InvalidToken
        })?;

        if !response.status().is_success() {
            tracing::error!(url = %url, status = %response.status(), "JWKS endpoint returned error");
            return Err(AuthError::InvalidToken);
        }

        response.json::<JwkSet>().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "Failed to parse JWKS response");
            AuthError::InvalidToken
        })
    }
}

impl Default for KeySetCache {
    fn default() -> Self {
        Self::new()
    }
}
