//! Credential session and operation dispatch for Key Vault Manager.
//!
//! Sits between the UI and the vault client: collects credential fields
//! one at a time, validates them when an operation executes, runs at
//! most one operation at a time, and turns every outcome into a typed
//! [`OperationResult`].

pub mod dispatcher;
pub mod operation;
pub mod store;

pub use dispatcher::Dispatcher;
pub use operation::{
    ErrorKind, OperationPayload, OperationRequest, OperationResult, OperationState,
};
pub use store::{CredentialField, CredentialStore};
