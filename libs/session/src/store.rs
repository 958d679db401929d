//! Session-scoped credential storage.
//!
//! Fields arrive one at a time as the user types; the store keeps the
//! last value per field and hands out immutable snapshots. Nothing is
//! validated here and nothing is persisted.

use keyvault_client::Credentials;
use secrecy::SecretString;
use std::sync::{Mutex, PoisonError};

/// The credential fields the UI collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    /// Identity provider tenant
    TenantId,
    /// OAuth client id
    ClientId,
    /// OAuth client secret
    ClientSecret,
    /// Vault name
    VaultName,
}

#[derive(Debug)]
struct Fields {
    tenant_id: String,
    client_id: String,
    client_secret: SecretString,
    vault_name: String,
}

impl Default for Fields {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: SecretString::from(""),
            vault_name: String::new(),
        }
    }
}

/// In-memory holder for the four credential fields.
#[derive(Debug, Default)]
pub struct CredentialStore {
    fields: Mutex<Fields>,
}

impl CredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value of one field, keeping the others.
    pub fn set_field(&self, field: CredentialField, value: impl Into<String>) {
        let value = value.into();
        let mut fields = self.lock();
        match field {
            CredentialField::TenantId => fields.tenant_id = value,
            CredentialField::ClientId => fields.client_id = value,
            CredentialField::ClientSecret => fields.client_secret = SecretString::from(value),
            CredentialField::VaultName => fields.vault_name = value,
        }
    }

    /// An immutable snapshot of the current field values.
    #[must_use]
    pub fn snapshot(&self) -> Credentials {
        let fields = self.lock();
        Credentials::new(
            fields.tenant_id.clone(),
            fields.client_id.clone(),
            fields.client_secret.clone(),
            fields.vault_name.clone(),
        )
    }

    /// Wipe every field (logout/unmount).
    pub fn clear(&self) {
        *self.lock() = Fields::default();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Fields> {
        self.fields.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
