use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown credential kind: {0}")]
    UnknownCredentialKind(String),

    #[error("invalid credential: {0}")]
    InvalidCredential(String),
}
