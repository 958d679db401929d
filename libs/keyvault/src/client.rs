//! Vault secrets HTTP client.
//!
//! Wraps the vault REST surface (list/get/set) with bearer-token
//! authorization, a single 401-triggered token refresh, bounded
//! exponential backoff for transient failures, and a circuit breaker
//! around the endpoint.

use crate::config::KeyVaultConfig;
use crate::credentials::Credentials;
use crate::error::{VaultError, VaultResult};
use crate::token::{AccessToken, TokenSource};
use crate::types::{SecretBundle, SecretEntry, SecretListPage, parse_secret_id};
use kv_common::{CircuitBreaker, Retryable, RetryPolicy, build_http_client};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Client for one vault session.
///
/// Holds the token cache through an [`Arc<TokenSource>`] so it can be
/// shared with callers that need to invalidate or inspect it.
pub struct SecretsClient {
    config: KeyVaultConfig,
    http: Client,
    tokens: Arc<TokenSource>,
    retry: RetryPolicy,
    breaker: CircuitBreaker,
}

impl SecretsClient {
    /// Create a client, building its HTTP client and token source from
    /// the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: KeyVaultConfig) -> VaultResult<Self> {
        let http = build_http_client(&config.http)?;
        let tokens = Arc::new(TokenSource::new(&config, http.clone()));
        Ok(Self::with_token_source(config, http, tokens))
    }

    /// Create a client around an existing token source.
    #[must_use]
    pub fn with_token_source(
        config: KeyVaultConfig,
        http: Client,
        tokens: Arc<TokenSource>,
    ) -> Self {
        let retry = RetryPolicy::new(config.retry.clone());
        let breaker = CircuitBreaker::new(config.breaker.clone());
        Self {
            config,
            http,
            tokens,
            retry,
            breaker,
        }
    }

    /// The token source backing this client.
    #[must_use]
    pub fn token_source(&self) -> Arc<TokenSource> {
        Arc::clone(&self.tokens)
    }

    /// List the names of all secrets in the vault, following pagination
    /// links until the listing is exhausted.
    ///
    /// Names are returned in the order the vault yields them.
    ///
    /// # Errors
    ///
    /// See [`VaultError`]; transient failures are retried before
    /// surfacing.
    #[instrument(skip(self, credentials), fields(vault = %credentials.vault_name))]
    pub async fn list_secrets(&self, credentials: &Credentials) -> VaultResult<Vec<String>> {
        let mut names = Vec::new();
        let mut url = format!(
            "{}/secrets?api-version={}",
            self.config.vault_base_url(&credentials.vault_name),
            self.config.api_version
        );

        loop {
            let page: SecretListPage = self
                .send_json(Method::GET, &url, None, credentials)
                .await?;
            for item in &page.value {
                let (name, _) = parse_secret_id(&item.id)?;
                names.push(name);
            }
            match page.next_link {
                Some(next) if !next.is_empty() => url = next,
                _ => break,
            }
        }

        debug!(count = names.len(), "listed secrets");
        Ok(names)
    }

    /// Fetch the latest enabled version of a secret.
    ///
    /// # Errors
    ///
    /// [`VaultError::SecretNotFound`] when the name is absent or its
    /// latest version is disabled; see [`VaultError`] for the rest.
    #[instrument(skip(self, credentials), fields(vault = %credentials.vault_name, secret = %name))]
    pub async fn get_secret(
        &self,
        credentials: &Credentials,
        name: &str,
    ) -> VaultResult<SecretEntry> {
        ensure_valid_name(name)?;
        let url = format!(
            "{}/secrets/{name}?api-version={}",
            self.config.vault_base_url(&credentials.vault_name),
            self.config.api_version
        );

        let bundle: SecretBundle = self
            .send_json(Method::GET, &url, None, credentials)
            .await?;
        let entry = SecretEntry::from_bundle(bundle)?;
        if !entry.enabled {
            debug!("latest version is disabled");
            return Err(VaultError::not_found(name));
        }
        Ok(entry)
    }

    /// Store a new version of a secret and return it.
    ///
    /// The vault is append-only: every write creates a new version, so a
    /// retried write after a transient failure may leave an extra
    /// version behind. That duplicate is a documented side effect and is
    /// not deduplicated here.
    ///
    /// # Errors
    ///
    /// See [`VaultError`].
    #[instrument(skip(self, credentials, value), fields(vault = %credentials.vault_name, secret = %name))]
    pub async fn set_secret(
        &self,
        credentials: &Credentials,
        name: &str,
        value: &str,
    ) -> VaultResult<SecretEntry> {
        ensure_valid_name(name)?;
        let url = format!(
            "{}/secrets/{name}?api-version={}",
            self.config.vault_base_url(&credentials.vault_name),
            self.config.api_version
        );
        let body = serde_json::json!({ "value": value });

        let bundle: SecretBundle = self
            .send_json(Method::PUT, &url, Some(body), credentials)
            .await?;
        SecretEntry::from_bundle(bundle)
    }

    /// Issue one logical request: circuit breaker, then bounded retries
    /// around the authorized attempt.
    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
        credentials: &Credentials,
    ) -> VaultResult<T> {
        if !self.breaker.try_acquire().await {
            warn!("circuit open for vault endpoint");
            return Err(VaultError::unavailable("circuit open for vault endpoint"));
        }

        let result = self
            .retry
            .execute(|| self.send_once(method.clone(), url, body.clone(), credentials))
            .await;

        match &result {
            Ok(_) => self.breaker.report_success().await,
            Err(e) if e.is_retryable() => self.breaker.report_failure().await,
            Err(_) => {}
        }

        result
    }

    /// One authorized attempt, with at most one token refresh on 401.
    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
        credentials: &Credentials,
    ) -> VaultResult<T> {
        let token = self.tokens.acquire(credentials).await?;
        let response = self
            .dispatch(method.clone(), url, body.as_ref(), &token)
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("vault rejected the bearer token, refreshing once");
            self.tokens.invalidate().await;
            let fresh = self.tokens.acquire(credentials).await?;
            let retried = self.dispatch(method, url, body.as_ref(), &fresh).await?;
            if retried.status() == StatusCode::UNAUTHORIZED {
                return Err(VaultError::auth_failed(
                    "vault rejected a freshly acquired token",
                ));
            }
            return decode(retried).await;
        }

        decode(response).await
    }

    async fn dispatch(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
        token: &AccessToken,
    ) -> VaultResult<Response> {
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(token.expose())
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(b) = body {
            request = request.json(b);
        }
        Ok(request.send().await?)
    }
}

/// Map a vault response to a typed result.
async fn decode<T: DeserializeOwned>(response: Response) -> VaultResult<T> {
    let status = response.status();
    let resource = response.url().path().to_string();

    match status.as_u16() {
        200..=299 => response
            .json()
            .await
            .map_err(|e| VaultError::invalid_response(e.to_string())),
        401 => Err(VaultError::auth_failed("vault rejected the bearer token")),
        403 => Err(VaultError::forbidden(resource)),
        404 => Err(VaultError::not_found(secret_name_from_path(&resource))),
        429 => Err(VaultError::RateLimited),
        500..=599 => Err(VaultError::unavailable(format!(
            "vault returned status {status}"
        ))),
        other => Err(VaultError::UnexpectedStatus(other)),
    }
}

/// Best-effort secret name for not-found messages.
fn secret_name_from_path(path: &str) -> String {
    path.strip_prefix("/secrets/")
        .map_or(path, |rest| rest.split('/').next().unwrap_or(rest))
        .to_string()
}

/// Secret names are 1-127 ASCII alphanumerics or dashes.
fn ensure_valid_name(name: &str) -> VaultResult<()> {
    let ok = !name.is_empty()
        && name.len() <= 127
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-');
    if ok {
        Ok(())
    } else {
        Err(VaultError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names_pass() {
        assert!(ensure_valid_name("db-password").is_ok());
        assert!(ensure_valid_name("A1").is_ok());
    }

    #[test]
    fn invalid_names_rejected() {
        assert!(matches!(
            ensure_valid_name(""),
            Err(VaultError::InvalidName(_))
        ));
        assert!(ensure_valid_name("a/b").is_err());
        assert!(ensure_valid_name("a b").is_err());
        assert!(ensure_valid_name(&"x".repeat(128)).is_err());
    }

    #[test]
    fn not_found_message_uses_secret_name() {
        assert_eq!(secret_name_from_path("/secrets/db-password"), "db-password");
        assert_eq!(secret_name_from_path("/secrets/a/b"), "a");
        assert_eq!(secret_name_from_path("/other"), "/other");
    }
}
