// src/error.rs
// Standardized error types for Machina

use thiserror::Error;

/// Main error type for the Machina library.
///
/// The first five variants are the caller-visible taxonomy: authorization,
/// authentication, unsupported host, validation, and execution failures.
/// A command that ran and exited non-zero is NOT an error — it comes back as
/// a normal `CommandOutput` with `success: false`.
#[derive(Error, Debug)]
pub enum MachinaError {
    #[error("sudo authentication required; call authenticate_sudo first")]
    AuthorizationRequired,

    #[error("sudo authentication failed; check the password")]
    AuthenticationFailed,

    #[error("no supported package manager found on this host")]
    UnsupportedEnvironment,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("execution failure: {0}")]
    Execution(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown error: {0}")]
    Other(String),
}

/// Convenience type alias for Result using MachinaError
pub type Result<T> = std::result::Result<T, MachinaError>;

impl MachinaError {
    /// Convert to user-facing string for the tool dispatch boundary
    pub fn to_user_string(&self) -> String {
        self.to_string()
    }
}

impl From<String> for MachinaError {
    fn from(s: String) -> Self {
        MachinaError::Other(s)
    }
}

impl From<tokio::task::JoinError> for MachinaError {
    fn from(err: tokio::task::JoinError) -> Self {
        MachinaError::Other(err.to_string())
    }
}
