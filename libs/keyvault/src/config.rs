//! Key Vault client configuration.

use kv_common::{CircuitBreakerConfig, HttpConfig, RetryConfig};
use std::time::Duration;

/// Key Vault client configuration.
///
/// Defaults target the public Azure cloud; the endpoint overrides exist
/// so tests can point both the token exchange and the vault API at a
/// local server.
#[derive(Debug, Clone)]
pub struct KeyVaultConfig {
    /// Identity provider base URL for the token exchange
    pub authority_host: String,
    /// DNS suffix appended to the vault name
    pub vault_dns_suffix: String,
    /// Fixed vault base URL, overriding name-based addressing
    pub vault_endpoint: Option<String>,
    /// Vault REST API version
    pub api_version: String,
    /// OAuth scope requested during the token exchange
    pub token_scope: String,
    /// How long before expiry a cached token is refreshed
    pub token_refresh_margin: Duration,
    /// HTTP client settings
    pub http: HttpConfig,
    /// Retry policy for transient failures
    pub retry: RetryConfig,
    /// Circuit breaker settings for the vault endpoint
    pub breaker: CircuitBreakerConfig,
}

impl Default for KeyVaultConfig {
    fn default() -> Self {
        Self {
            authority_host: std::env::var("KEYVAULT_AUTHORITY_HOST")
                .unwrap_or_else(|_| "https://login.microsoftonline.com".to_string()),
            vault_dns_suffix: "vault.azure.net".to_string(),
            vault_endpoint: None,
            api_version: "7.4".to_string(),
            token_scope: "https://vault.azure.net/.default".to_string(),
            token_refresh_margin: Duration::from_secs(60),
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl KeyVaultConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identity provider base URL.
    #[must_use]
    pub fn with_authority_host(mut self, host: impl Into<String>) -> Self {
        self.authority_host = host.into();
        self
    }

    /// Pin the vault base URL instead of deriving it from the vault name.
    #[must_use]
    pub fn with_vault_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.vault_endpoint = Some(endpoint.into());
        self
    }

    /// Set the vault REST API version.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set the token refresh margin.
    #[must_use]
    pub const fn with_token_refresh_margin(mut self, margin: Duration) -> Self {
        self.token_refresh_margin = margin;
        self
    }

    /// Set the HTTP client settings.
    #[must_use]
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Set the retry policy configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set the circuit breaker configuration.
    #[must_use]
    pub fn with_breaker(mut self, breaker: CircuitBreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }

    /// Token endpoint URL for the given tenant.
    #[must_use]
    pub fn token_url(&self, tenant_id: &str) -> String {
        format!(
            "{}/{tenant_id}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/')
        )
    }

    /// Base URL of the vault addressed by the given name.
    #[must_use]
    pub fn vault_base_url(&self, vault_name: &str) -> String {
        self.vault_endpoint.as_ref().map_or_else(
            || format!("https://{vault_name}.{}", self.vault_dns_suffix),
            |endpoint| endpoint.trim_end_matches('/').to_string(),
        )
    }
}
