use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },
    #[error("Unexpected status ({status}): {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("Could not decode response: {0}")]
    Decode(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No bearer credential in session")]
    MissingCredential,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Classifies a non-success HTTP status the way the backend's callers expect.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            400 => DomainError::BadRequest(body),
            401 => DomainError::Unauthorized,
            403 => DomainError::Forbidden,
            404 => DomainError::NotFound(body),
            500..=599 => DomainError::Server { status, body },
            _ => DomainError::UnexpectedStatus { status, body },
        }
    }
}
