//! Azure Key Vault secrets client for Key Vault Manager.
//!
//! Exchanges client credentials for a bearer token, caches it until near
//! expiry, and issues list/get/set secret requests against the vault's
//! REST API with bounded retries.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod token;
pub mod types;

pub use client::SecretsClient;
pub use config::KeyVaultConfig;
pub use credentials::{CredentialError, Credentials};
pub use error::{VaultError, VaultResult};
pub use token::{AccessToken, Clock, SystemClock, TokenSource};
pub use types::{SecretAttributes, SecretEntry};
