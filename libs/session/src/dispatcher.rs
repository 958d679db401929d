//! Operation dispatch and the one-at-a-time state machine.
//!
//! Each user-triggered operation moves the session through
//! `Idle -> Running -> Succeeded | Failed`. A trigger while another
//! operation is running is rejected with a busy result rather than
//! queued. No failure crosses this boundary as anything but a typed
//! [`OperationResult`].

use crate::operation::{
    ErrorKind, OperationPayload, OperationRequest, OperationResult, OperationState,
};
use crate::store::{CredentialField, CredentialStore};
use keyvault_client::{SecretsClient, VaultError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{Instrument, debug, warn};
use uuid::Uuid;

/// Dispatches UI operations onto the vault client.
pub struct Dispatcher {
    store: CredentialStore,
    client: SecretsClient,
    state: Mutex<OperationState>,
    closed: AtomicBool,
}

impl Dispatcher {
    /// Create a dispatcher with an empty credential store.
    #[must_use]
    pub fn new(client: SecretsClient) -> Self {
        Self {
            store: CredentialStore::new(),
            client,
            state: Mutex::new(OperationState::Idle),
            closed: AtomicBool::new(false),
        }
    }

    /// Replace one credential field.
    pub fn set_credential_field(&self, field: CredentialField, value: impl Into<String>) {
        self.store.set_field(field, value);
    }

    /// The credential store backing this session.
    #[must_use]
    pub const fn credential_store(&self) -> &CredentialStore {
        &self.store
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> OperationState {
        *self.lock_state()
    }

    /// Tear the session down: wipe credentials and stop state updates.
    ///
    /// An operation already in flight finishes its network call
    /// best-effort but no longer writes the session's terminal state.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.store.clear();
    }

    /// Whether the session has been torn down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Execute one operation.
    ///
    /// Rejects with a busy result when another operation is running;
    /// validates input before touching the network; never panics or
    /// returns a raw provider error.
    pub async fn execute(&self, request: OperationRequest) -> OperationResult {
        if self.is_closed() {
            return OperationResult::failed(ErrorKind::Validation, "The session is closed");
        }

        {
            let mut state = self.lock_state();
            if *state == OperationState::Running {
                return OperationResult::failed(
                    ErrorKind::Busy,
                    "An operation is already running",
                );
            }
            *state = OperationState::Running;
        }

        let operation_id = Uuid::new_v4();
        let span = tracing::info_span!("operation", id = %operation_id, kind = request.kind());
        let result = self.run(&request).instrument(span).await;

        if self.is_closed() {
            debug!("session closed during operation, leaving state untouched");
        } else {
            *self.lock_state() = if result.success {
                OperationState::Succeeded
            } else {
                OperationState::Failed
            };
        }

        result
    }

    async fn run(&self, request: &OperationRequest) -> OperationResult {
        let credentials = self.store.snapshot();
        if let Err(error) = credentials.validate() {
            debug!(%error, "rejected before dispatch");
            return OperationResult::failed(ErrorKind::Validation, error.to_string());
        }

        match request {
            OperationRequest::List => match self.client.list_secrets(&credentials).await {
                Ok(names) => {
                    let message = match names.len() {
                        1 => "Found 1 secret".to_string(),
                        n => format!("Found {n} secrets"),
                    };
                    OperationResult::succeeded(OperationPayload::SecretNames(names), message)
                }
                Err(error) => Self::failure(&error),
            },
            OperationRequest::Get { name } => {
                if name.trim().is_empty() {
                    return OperationResult::failed(
                        ErrorKind::Validation,
                        "A secret name is required",
                    );
                }
                match self.client.get_secret(&credentials, name).await {
                    Ok(entry) => {
                        let message = format!("Retrieved secret '{}'", entry.name);
                        OperationResult::succeeded(OperationPayload::Secret(entry), message)
                    }
                    Err(error) => Self::failure(&error),
                }
            }
            OperationRequest::Set { name, value } => {
                if name.trim().is_empty() {
                    return OperationResult::failed(
                        ErrorKind::Validation,
                        "A secret name is required",
                    );
                }
                if value.is_empty() {
                    return OperationResult::failed(
                        ErrorKind::Validation,
                        "A secret value is required",
                    );
                }
                match self.client.set_secret(&credentials, name, value).await {
                    Ok(entry) => {
                        let message = format!("Stored a new version of secret '{}'", entry.name);
                        OperationResult::succeeded(OperationPayload::Secret(entry), message)
                    }
                    Err(error) => Self::failure(&error),
                }
            }
        }
    }

    /// Convert a vault error into the user-facing result. This is the
    /// single place provider failures become text; raw payloads stay
    /// out of it.
    fn failure(error: &VaultError) -> OperationResult {
        warn!(%error, "operation failed");
        match error {
            VaultError::AuthenticationFailed(_) => OperationResult::failed(
                ErrorKind::Auth,
                "Authentication with the vault failed; check the credentials",
            ),
            VaultError::Forbidden(_) => OperationResult::failed(
                ErrorKind::Auth,
                "The credential is not permitted to perform this operation",
            ),
            VaultError::SecretNotFound(name) => OperationResult::failed(
                ErrorKind::NotFound,
                format!("Secret '{name}' was not found"),
            ),
            VaultError::InvalidName(name) => OperationResult::failed(
                ErrorKind::Validation,
                format!("{name:?} is not a valid secret name"),
            ),
            VaultError::RateLimited | VaultError::Unavailable(_) | VaultError::Http(_) => {
                OperationResult::failed(
                    ErrorKind::Network,
                    "The vault could not be reached; try again in a moment",
                )
            }
            VaultError::InvalidResponse(_) | VaultError::UnexpectedStatus(_) => {
                OperationResult::failed(
                    ErrorKind::Unknown,
                    "The vault returned an unexpected response",
                )
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, OperationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
