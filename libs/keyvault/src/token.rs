//! Bearer token acquisition and caching.
//!
//! Tokens come from an OAuth2 client-credentials exchange against the
//! tenant's token endpoint. The cache is owned explicitly by the
//! [`TokenSource`] so sessions and tests control its lifetime; expiry is
//! measured against an injectable clock.

use crate::config::KeyVaultConfig;
use crate::credentials::Credentials;
use crate::error::{VaultError, VaultResult};
use crate::types::{TokenErrorResponse, TokenResponse};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

/// Source of `Instant`s, injectable for expiry tests.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// Clock backed by the system monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A bearer token. The value never appears in Debug output and is not
/// exposed outside this crate.
#[derive(Clone)]
pub struct AccessToken {
    value: SecretString,
}

impl AccessToken {
    pub(crate) fn new(value: String) -> Self {
        Self {
            value: SecretString::from(value),
        }
    }

    pub(crate) fn expose(&self) -> &str {
        self.value.expose_secret()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

struct CachedToken {
    token: AccessToken,
    expires_at: Instant,
}

/// Acquires and caches bearer tokens for vault requests.
///
/// The cache sits behind an async mutex that is held across the whole
/// exchange, which collapses concurrent `acquire` calls into a single
/// outstanding request against the token endpoint.
pub struct TokenSource {
    http: Client,
    authority_host: String,
    scope: String,
    refresh_margin: Duration,
    cache: Mutex<Option<CachedToken>>,
    clock: Arc<dyn Clock>,
}

impl TokenSource {
    /// Create a token source using the system clock.
    #[must_use]
    pub fn new(config: &KeyVaultConfig, http: Client) -> Self {
        Self::with_clock(config, http, Arc::new(SystemClock))
    }

    /// Create a token source with an injected clock.
    #[must_use]
    pub fn with_clock(config: &KeyVaultConfig, http: Client, clock: Arc<dyn Clock>) -> Self {
        Self {
            http,
            authority_host: config.authority_host.trim_end_matches('/').to_string(),
            scope: config.token_scope.clone(),
            refresh_margin: config.token_refresh_margin,
            cache: Mutex::new(None),
            clock,
        }
    }

    /// Return a valid bearer token, exchanging client credentials for a
    /// fresh one if the cache is empty or expiring within the margin.
    ///
    /// # Errors
    ///
    /// [`VaultError::AuthenticationFailed`] when the token endpoint
    /// rejects the credentials; transport failures as
    /// [`VaultError::Http`].
    #[instrument(skip(self, credentials), fields(tenant = %credentials.tenant_id))]
    pub async fn acquire(&self, credentials: &Credentials) -> VaultResult<AccessToken> {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.expires_at > self.clock.now() + self.refresh_margin {
                return Ok(cached.token.clone());
            }
            debug!("cached token is expiring, refreshing");
        }

        let fresh = self.exchange(credentials).await?;
        let token = fresh.token.clone();
        *cache = Some(fresh);
        Ok(token)
    }

    /// Drop the cached token so the next `acquire` performs an exchange.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    async fn exchange(&self, credentials: &Credentials) -> VaultResult<CachedToken> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host, credentials.tenant_id
        );
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.expose_secret()),
            ("scope", self.scope.as_str()),
        ];

        let response = self.http.post(&url).form(&params).send().await?;
        let status = response.status();

        match status.as_u16() {
            200..=299 => {
                let mut body: TokenResponse = response
                    .json()
                    .await
                    .map_err(|e| VaultError::invalid_response(e.to_string()))?;
                if !body.token_type.eq_ignore_ascii_case("bearer") && !body.token_type.is_empty() {
                    return Err(VaultError::invalid_response(format!(
                        "unsupported token type: {}",
                        body.token_type
                    )));
                }
                let expires_at = self.clock.now() + Duration::from_secs(body.expires_in);
                let token = AccessToken::new(std::mem::take(&mut body.access_token));
                debug!(expires_in = body.expires_in, "acquired bearer token");
                Ok(CachedToken { token, expires_at })
            }
            400 | 401 | 403 => {
                let reason = response
                    .json::<TokenErrorResponse>()
                    .await
                    .map(|e| e.error)
                    .unwrap_or_default();
                warn!(%status, %reason, "token endpoint rejected the credentials");
                Err(VaultError::auth_failed(format!(
                    "token endpoint rejected the credentials ({reason})"
                )))
            }
            429 => Err(VaultError::RateLimited),
            500..=599 => Err(VaultError::unavailable(format!(
                "token endpoint returned status {status}"
            ))),
            other => Err(VaultError::UnexpectedStatus(other)),
        }
    }
}
