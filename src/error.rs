//! Error types for td
//!
//! Every failure is classified into one taxonomy kind so all call sites
//! report write failures the same way:
//! - validation: rejected locally, no write was issued
//! - permission: rejected by the backend (auth, ownership, invariants)
//! - not_found: the referenced document or account does not exist
//! - network: the backend could not be reached or the store could not commit
//! - unknown: everything else
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (validation, not found)
//! - 3: Blocked by the backend (permission)
//! - 4: Operation failed (network, unknown)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the td CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const PERMISSION_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Failure taxonomy shared by every write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Permission,
    NotFound,
    Network,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Permission => "permission",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Network => "network",
            ErrorKind::Unknown => "unknown",
        }
    }
}

/// Main error type for td operations
#[derive(Error, Debug)]
pub enum Error {
    // Validation (exit code 2): detected locally, no write issued
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // Permission (exit code 3): rejected by the backend
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account already exists for {0}")]
    EmailInUse(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Document {id} is not owned by the signed-in user")]
    NotOwner { id: String },

    #[error("A profile already exists for this account")]
    ProfileExists,

    // Not found (exit code 2)
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Profile not found")]
    ProfileNotFound,

    #[error("No account found for {0}")]
    AccountNotFound(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Classify this error into the shared failure taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingField(_)
            | Error::InvalidArgument(_)
            | Error::PasswordMismatch
            | Error::InvalidConfig(_)
            | Error::TomlParse(_) => ErrorKind::Validation,

            Error::InvalidCredentials
            | Error::EmailInUse(_)
            | Error::NotSignedIn
            | Error::NotOwner { .. }
            | Error::ProfileExists => ErrorKind::Permission,

            Error::TaskNotFound(_) | Error::ProfileNotFound | Error::AccountNotFound(_) => {
                ErrorKind::NotFound
            }

            Error::Io(_) | Error::LockFailed(_) => ErrorKind::Network,

            Error::Json(_) | Error::OperationFailed(_) => ErrorKind::Unknown,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::NotFound => exit_codes::USER_ERROR,
            ErrorKind::Permission => exit_codes::PERMISSION_BLOCKED,
            ErrorKind::Network | ErrorKind::Unknown => exit_codes::OPERATION_FAILED,
        }
    }
}

/// Result type alias for td operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub kind: &'static str,
    pub code: i32,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            kind: err.kind().as_str(),
            code: err.exit_code(),
        }
    }
}
