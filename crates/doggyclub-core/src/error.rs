//! Error types for the DoggyClub backend.

use thiserror::Error;

/// Result type alias using the DoggyClub error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for encounter and location operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Dog not found
    #[error("Dog not found: {0}")]
    DogNotFound(uuid::Uuid),

    /// No device location has been reported for the dog
    #[error("Dog location not found: {0}")]
    LocationNotFound(uuid::Uuid),

    /// Request collides with existing state (e.g. a recent encounter)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error means a referenced entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::DogNotFound(_) | Error::LocationNotFound(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
