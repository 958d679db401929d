//! Session credentials for the vault.
//!
//! A [`Credentials`] value is an immutable snapshot of the four fields
//! the UI collects. It is held only in memory and validated when an
//! operation executes, not while the user is still typing.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Validation failures caught before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// A required field is empty
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The vault name does not satisfy the vault naming rules
    #[error("{0:?} is not a valid vault name")]
    InvalidVaultName(String),
}

/// Client credentials plus the vault they address.
#[derive(Clone)]
pub struct Credentials {
    /// Identity provider tenant the client is registered under
    pub tenant_id: String,
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
    /// Vault name, resolved to the vault endpoint by the client
    pub vault_name: String,
}

impl Credentials {
    /// Create a credentials snapshot.
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<SecretString>,
        vault_name: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            vault_name: vault_name.into(),
        }
    }

    /// Validate that every field is present and the vault name is
    /// well-formed.
    ///
    /// # Errors
    ///
    /// Returns the first [`CredentialError`] encountered; nothing has
    /// touched the network at that point.
    pub fn validate(&self) -> Result<(), CredentialError> {
        if self.tenant_id.trim().is_empty() {
            return Err(CredentialError::MissingField("tenant id"));
        }
        if self.client_id.trim().is_empty() {
            return Err(CredentialError::MissingField("client id"));
        }
        if self.client_secret.expose_secret().is_empty() {
            return Err(CredentialError::MissingField("client secret"));
        }
        if self.vault_name.trim().is_empty() {
            return Err(CredentialError::MissingField("vault name"));
        }
        if !is_valid_vault_name(&self.vault_name) {
            return Err(CredentialError::InvalidVaultName(self.vault_name.clone()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("vault_name", &self.vault_name)
            .finish()
    }
}

/// Vault naming rules: 3-24 characters, ASCII alphanumerics and dashes,
/// starting with a letter, ending with a letter or digit, and no
/// consecutive dashes.
fn is_valid_vault_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    if !(3..=24).contains(&bytes.len()) {
        return false;
    }
    if !bytes[0].is_ascii_alphabetic() {
        return false;
    }
    if !bytes[bytes.len() - 1].is_ascii_alphanumeric() {
        return false;
    }
    if !bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-') {
        return false;
    }
    !name.contains("--")
}
