use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::ports::Severity;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network or unknown error: {0}")]
    Network(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Session expired")]
    SessionExpired,

    #[error("Access denied")]
    AccessDenied,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error ({0})")]
    Server(u16),

    #[error("Unexpected response ({0})")]
    Unexpected(u16),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Network(msg) => AppError::Network(msg),
            DomainError::BadRequest(msg) => AppError::BadRequest(msg),
            DomainError::Unauthorized | DomainError::MissingCredential => AppError::SessionExpired,
            DomainError::Forbidden => AppError::AccessDenied,
            DomainError::NotFound(msg) => AppError::NotFound(msg),
            DomainError::Server { status, .. } => AppError::Server(status),
            DomainError::UnexpectedStatus { status, .. } => AppError::Unexpected(status),
            DomainError::InvalidInput(msg) => AppError::InvalidInput(msg),
            DomainError::Decode(msg) | DomainError::Storage(msg) | DomainError::Internal(msg) => {
                AppError::Internal(msg)
            }
        }
    }
}

impl AppError {
    /// User-facing message and severity for this error.
    pub fn notice(&self) -> (&'static str, Severity) {
        match self {
            AppError::Network(_) => ("Network or unknown error.", Severity::Error),
            AppError::BadRequest(_) => ("Bad request.", Severity::Warning),
            AppError::SessionExpired => ("Session expired. Please log in again.", Severity::Error),
            AppError::AccessDenied => ("Access denied.", Severity::Error),
            AppError::NotFound(_) => ("Page not found.", Severity::Warning),
            AppError::Server(_) => ("Server error. Please try again later.", Severity::Error),
            AppError::Unexpected(_) | AppError::InvalidInput(_) => {
                ("An unexpected error occurred.", Severity::Warning)
            }
            AppError::Config(_) | AppError::Internal(_) => {
                ("An unexpected error occurred.", Severity::Error)
            }
        }
    }

    /// A rejected credential terminates the session.
    pub fn ends_session(&self) -> bool {
        matches!(self, AppError::SessionExpired)
    }
}
