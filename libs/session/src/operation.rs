//! Operation requests, results, and the session state machine states.

use keyvault_client::SecretEntry;

/// A UI-triggered vault operation.
#[derive(Clone, PartialEq, Eq)]
pub enum OperationRequest {
    /// List the names of all secrets in the vault
    List,
    /// Fetch the latest enabled version of one secret
    Get {
        /// Secret name
        name: String,
    },
    /// Store a new version of one secret
    Set {
        /// Secret name
        name: String,
        /// Secret value to store
        value: String,
    },
}

impl OperationRequest {
    /// Short operation kind for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get { .. } => "get",
            Self::Set { .. } => "set",
        }
    }
}

impl std::fmt::Debug for OperationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List => f.debug_struct("List").finish(),
            Self::Get { name } => f.debug_struct("Get").field("name", name).finish(),
            Self::Set { name, .. } => f
                .debug_struct("Set")
                .field("name", name)
                .field("value", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Failure classification surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input, caught before any network call
    Validation,
    /// Credential or token rejection
    Auth,
    /// Secret absent
    NotFound,
    /// Transport failure after retries were exhausted
    Network,
    /// Unexpected provider response shape
    Unknown,
    /// Another operation is already running
    Busy,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Validation => "validation",
            Self::Auth => "auth",
            Self::NotFound => "not-found",
            Self::Network => "network",
            Self::Unknown => "unknown",
            Self::Busy => "busy",
        };
        f.write_str(label)
    }
}

/// Normalized payload of a successful operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationPayload {
    /// Nothing beyond the message
    None,
    /// Secret names from a list operation
    SecretNames(Vec<String>),
    /// A single secret entry from a get or set operation
    Secret(SecretEntry),
}

/// Outcome of one operation, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    /// Whether the operation succeeded
    pub success: bool,
    /// Payload on success, [`OperationPayload::None`] otherwise
    pub payload: OperationPayload,
    /// Human-readable outcome text
    pub message: String,
    /// Failure classification, `None` on success
    pub error: Option<ErrorKind>,
}

impl OperationResult {
    pub(crate) fn succeeded(payload: OperationPayload, message: impl Into<String>) -> Self {
        Self {
            success: true,
            payload,
            message: message.into(),
            error: None,
        }
    }

    pub(crate) fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: OperationPayload::None,
            message: message.into(),
            error: Some(kind),
        }
    }

    /// Whether this is the reject-while-running result.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.error == Some(ErrorKind::Busy)
    }
}

/// Session state across operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// No operation has run yet
    Idle,
    /// An operation is in flight
    Running,
    /// The last operation succeeded
    Succeeded,
    /// The last operation failed
    Failed,
}
