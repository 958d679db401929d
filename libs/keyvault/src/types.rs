//! Wire types for the token endpoint and the vault secrets API.

use crate::error::{VaultError, VaultResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Token endpoint success response. Wiped on drop; the access token is
/// moved into a [`crate::token::AccessToken`] before that.
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: String,
}

/// Token endpoint error body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenErrorResponse {
    #[serde(default)]
    pub error: String,
}

/// Secret management attributes.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SecretAttributes {
    /// Whether the secret version may be read
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Creation time of the version
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub created: Option<DateTime<Utc>>,
    /// Last update time of the version
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub updated: Option<DateTime<Utc>>,
}

impl Default for SecretAttributes {
    fn default() -> Self {
        Self {
            enabled: true,
            created: None,
            updated: None,
        }
    }
}

const fn default_enabled() -> bool {
    true
}

/// Secret bundle returned by get and set.
#[derive(Deserialize)]
pub(crate) struct SecretBundle {
    pub value: String,
    pub id: String,
    #[serde(default)]
    pub attributes: SecretAttributes,
}

/// One page of the secret list.
#[derive(Deserialize)]
pub(crate) struct SecretListPage {
    #[serde(default)]
    pub value: Vec<SecretListItem>,
    #[serde(rename = "nextLink", default)]
    pub next_link: Option<String>,
}

/// One entry of a list page. Only the identifier is needed; list
/// responses carry no secret values.
#[derive(Deserialize)]
pub(crate) struct SecretListItem {
    pub id: String,
}

/// A named, versioned secret as returned by get and set.
///
/// Immutable once returned; the value never appears in Debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretEntry {
    /// Secret name
    pub name: String,
    /// Secret value of this version
    pub value: String,
    /// Version identifier assigned by the vault
    pub version: String,
    /// Whether this version is enabled
    pub enabled: bool,
    /// Creation time of this version
    pub created_on: Option<DateTime<Utc>>,
    /// Last update time of this version
    pub updated_on: Option<DateTime<Utc>>,
}

impl SecretEntry {
    pub(crate) fn from_bundle(bundle: SecretBundle) -> VaultResult<Self> {
        let (name, version) = parse_secret_id(&bundle.id)?;
        let version = version.ok_or_else(|| {
            VaultError::invalid_response(format!("secret identifier has no version: {}", bundle.id))
        })?;
        Ok(Self {
            name,
            value: bundle.value,
            version,
            enabled: bundle.attributes.enabled,
            created_on: bundle.attributes.created,
            updated_on: bundle.attributes.updated,
        })
    }
}

impl std::fmt::Debug for SecretEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretEntry")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("version", &self.version)
            .field("enabled", &self.enabled)
            .field("created_on", &self.created_on)
            .field("updated_on", &self.updated_on)
            .finish()
    }
}

/// Split a secret identifier URL into name and optional version.
///
/// Identifiers look like `https://{vault}/secrets/{name}` in list pages
/// and `https://{vault}/secrets/{name}/{version}` in secret bundles.
pub(crate) fn parse_secret_id(id: &str) -> VaultResult<(String, Option<String>)> {
    let url = Url::parse(id)
        .map_err(|_| VaultError::invalid_response(format!("malformed secret identifier: {id}")))?;
    let mut segments = url
        .path_segments()
        .ok_or_else(|| VaultError::invalid_response(format!("malformed secret identifier: {id}")))?;

    if segments.next() != Some("secrets") {
        return Err(VaultError::invalid_response(format!(
            "secret identifier outside the secrets collection: {id}"
        )));
    }

    let name = segments
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            VaultError::invalid_response(format!("secret identifier has no name: {id}"))
        })?
        .to_string();
    let version = segments
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok((name, version))
}
