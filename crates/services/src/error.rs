//! Shared error types for the services crate.

use thiserror::Error;

use prep_core::model::{Phase, QuestionError};
use prep_core::{DeviceError, ValidationError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Failures of a remote collaborator (question source, reviewer, auth API).
///
/// `Display` is the user-facing message; server-provided messages are kept verbatim.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CollaboratorError {
    #[error("{message}")]
    Rejected {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("you are not signed in")]
    Unauthorized,
    #[error("unexpected response from server: {0}")]
    Malformed(String),
    #[error("{0}")]
    Unsupported(&'static str),
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl From<QuestionError> for CollaboratorError {
    fn from(err: QuestionError) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Errors emitted by the practice session controller and its workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PracticeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error("cannot {action} while the session is {actual}")]
    InvalidPhase { action: &'static str, actual: Phase },
    #[error("please sign in to start a practice session")]
    Unauthorized,
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid configuration: {0}")]
    Config(String),
}
