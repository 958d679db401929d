//! Vault error types with retryability classification.

use kv_common::Retryable;
use thiserror::Error;

/// Errors produced by the token source and the secrets client.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Credential or token rejection, either at the token endpoint or
    /// on a request that failed again with a freshly acquired token
    #[error("vault authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The credential is valid but lacks permission
    #[error("vault access denied: {0}")]
    Forbidden(String),

    /// No enabled secret under the requested name
    #[error("secret not found: {0}")]
    SecretNotFound(String),

    /// Vault API rate limit exceeded
    #[error("vault rate limit exceeded")]
    RateLimited,

    /// Vault server unavailable
    #[error("vault unavailable: {0}")]
    Unavailable(String),

    /// Secret name rejected before any request was made
    #[error("invalid secret name: {0:?}")]
    InvalidName(String),

    /// Response body did not have the expected shape
    #[error("unexpected vault response: {0}")]
    InvalidResponse(String),

    /// Status code outside the documented surface
    #[error("unexpected vault status: {0}")]
    UnexpectedStatus(u16),

    /// HTTP transport error
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    /// Create an authentication failed error.
    #[must_use]
    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::AuthenticationFailed(msg.into())
    }

    /// Create a forbidden error.
    #[must_use]
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Create a secret not found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::SecretNotFound(name.into())
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an invalid response error.
    #[must_use]
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

impl Retryable for VaultError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::RateLimited | Self::Http(_)
        )
    }
}
