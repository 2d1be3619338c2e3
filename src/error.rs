//! Error types for the objectstore operator

use thiserror::Error;

/// Main error type for artifact synthesis
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Validation error for Tenant specs
    #[error("validation error: {0}")]
    Validation(String),

    /// Bearer token signing error
    #[error("credential error: {0}")]
    Credential(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Secret material could not be produced or read
    #[error("secret error: {0}")]
    Secret(String),
}

impl Error {
    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a credential error with the given message
    pub fn credential(msg: impl Into<String>) -> Self {
        Self::Credential(msg.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create a secret error with the given message
    pub fn secret(msg: impl Into<String>) -> Self {
        Self::Secret(msg.into())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
