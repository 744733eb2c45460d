use fletia_access::{values::ValueError, AccessError};
use thiserror::Error;

use crate::providers::mail::MailError;

/// Errors produced by marketplace operations.
///
/// The first group describes what the caller did wrong and maps onto client
/// errors at the transport layer; the rest are internal failures.
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    AlreadyExists(String),
    #[error("{0}")]
    FailedPrecondition(String),

    #[error("Database error: {0}")]
    Database(#[from] turso::Error),
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Mail delivery failed: {0}")]
    Mail(#[from] MailError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The coarse category of a [`MarketError`], used by transports to pick a
/// status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Unauthenticated,
    PermissionDenied,
    NotFound,
    AlreadyExists,
    FailedPrecondition,
    Internal,
}

impl MarketError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            MarketError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            MarketError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            MarketError::NotFound(_) => ErrorKind::NotFound,
            MarketError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            MarketError::FailedPrecondition(_) => ErrorKind::FailedPrecondition,
            MarketError::Database(_)
            | MarketError::DataIntegrity(_)
            | MarketError::Serialization(_)
            | MarketError::Mail(_)
            | MarketError::Io(_) => ErrorKind::Internal,
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        MarketError::InvalidArgument(msg.into())
    }

    pub fn denied(msg: impl Into<String>) -> Self {
        MarketError::PermissionDenied(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        MarketError::NotFound(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        MarketError::FailedPrecondition(msg.into())
    }
}

impl From<ValueError> for MarketError {
    fn from(err: ValueError) -> Self {
        match err {
            ValueError::Database(e) => MarketError::Database(e),
            other => MarketError::DataIntegrity(other.to_string()),
        }
    }
}

/// Account errors keep their meaning: a taken email is `AlreadyExists`, bad
/// credentials are `Unauthenticated`, and so on.
impl From<AccessError> for MarketError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Database(e) => MarketError::Database(e),
            AccessError::Value(e) => e.into(),
            AccessError::EmailAlreadyExists => MarketError::AlreadyExists(err.to_string()),
            AccessError::InvalidCredentials => MarketError::Unauthenticated(err.to_string()),
            AccessError::Disabled => MarketError::PermissionDenied(err.to_string()),
            AccessError::UserNotFound(_) => MarketError::NotFound(err.to_string()),
            AccessError::InvalidArgument(msg) => MarketError::InvalidArgument(msg),
            AccessError::UnknownRol(_) => MarketError::InvalidArgument(err.to_string()),
            AccessError::PasswordHash(_) | AccessError::UserPersistenceFailed(_) => {
                MarketError::DataIntegrity(err.to_string())
            }
        }
    }
}
