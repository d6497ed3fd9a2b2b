//! Error types for atlasfn
//!
//! Provides a unified error type for all operations.
//!
//! Errors fall into three families that callers usually need to tell apart:
//! - validation: rejected locally, nothing was sent
//! - remote: the store answered with an error reply
//! - transport: the store could not be reached or spoke garbage

use thiserror::Error;

use crate::protocol::CommandDescriptor;

/// Reply sent when `FCALL`/`FCALL_RO` names a function no library exports
const FUNCTION_NOT_FOUND: &str = "ERR Function not found";

/// Result type alias using FunctionError
pub type Result<T> = std::result::Result<T, FunctionError>;

/// Unified error type for atlasfn operations
#[derive(Debug, Error)]
pub enum FunctionError {
    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    #[error("Invalid request: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Decoding error: {0}")]
    Decoding(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    // -------------------------------------------------------------------------
    // Remote Errors (store replied with an error, message kept verbatim)
    // -------------------------------------------------------------------------
    #[error("No such function: {0}")]
    NoSuchFunction(String),

    #[error("Library already exists: {0}")]
    LibraryExists(String),

    #[error("Library not found: {0}")]
    LibraryNotFound(String),

    #[error("Function is not killable: {0}")]
    Unkillable(String),

    #[error("No function running: {0}")]
    NotBusy(String),

    #[error("Remote error: {0}")]
    Remote(String),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration / Runtime Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Async task failed: {0}")]
    TaskFailed(String),
}

impl FunctionError {
    /// Classify an error reply sent by the store in answer to `command`.
    ///
    /// Only the command that can produce a condition maps to its typed
    /// variant; anything else stays `Remote`. The message is kept exactly
    /// as received.
    pub fn from_server(command: &CommandDescriptor, message: impl Into<String>) -> Self {
        let message = message.into();

        match command.label {
            _ if command.is_call() => FunctionError::from_call(message),
            "FUNCTION_LOAD" | "FUNCTION_RESTORE" if message.contains("already exists") => {
                FunctionError::LibraryExists(message)
            }
            "FUNCTION_DELETE" if message.contains("Library not found") => {
                FunctionError::LibraryNotFound(message)
            }
            "FUNCTION_KILL" if message.starts_with("NOTBUSY") => FunctionError::NotBusy(message),
            "FUNCTION_KILL" if message.starts_with("UNKILLABLE") => {
                FunctionError::Unkillable(message)
            }
            _ => FunctionError::Remote(message),
        }
    }

    /// Classify an error reply to `FCALL`/`FCALL_RO`.
    ///
    /// Only the store's own unknown-function reply is `NoSuchFunction`;
    /// every error raised while the function runs is `Remote`, whatever its
    /// text.
    pub fn from_call(message: impl Into<String>) -> Self {
        let message = message.into();
        if message == FUNCTION_NOT_FOUND {
            FunctionError::NoSuchFunction(message)
        } else {
            FunctionError::Remote(message)
        }
    }

    /// True if the store rejected the request.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            FunctionError::NoSuchFunction(_)
                | FunctionError::LibraryExists(_)
                | FunctionError::LibraryNotFound(_)
                | FunctionError::Unkillable(_)
                | FunctionError::NotBusy(_)
                | FunctionError::Remote(_)
        )
    }

    /// True if the store could not be reached or the exchange broke down.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FunctionError::Io(_) | FunctionError::Network(_) | FunctionError::Protocol(_)
        )
    }

    /// True if the request was rejected before anything was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, FunctionError::Validation(_) | FunctionError::Encoding(_))
    }
}
