use thiserror::Error;

/// Application-wide error types for Scout.
#[derive(Error, Debug)]
pub enum AppError {
    /// The upstream listing provider was unreachable or answered with an error.
    #[error("Listing source error{}: {message}", status_code.map(|c| format!(" (HTTP {c})")).unwrap_or_default())]
    SourceFetchError {
        message: String,
        status_code: Option<u16>,
    },

    /// A store read or write failed.
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    /// A website liveness check failed.
    #[error("Verification error: {0}")]
    VerificationError(String),

    /// The query cache could not be read.
    #[error("Cache lookup error: {0}")]
    CacheLookupError(String),

    /// HTTP request failed for a reason other than timeout or connection.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Caller input rejected before any work started.
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A session action is not allowed from the session's current state.
    #[error("Cannot {action} a session that is {from}")]
    InvalidTransition { from: String, action: String },

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if the error only concerns a single record or check and
    /// must never abort the batch that contains it.
    pub fn is_record_scoped(&self) -> bool {
        matches!(
            self,
            AppError::PersistenceError(_)
                | AppError::VerificationError(_)
                | AppError::CacheLookupError(_)
                | AppError::Timeout(_)
                | AppError::NetworkError(_)
        )
    }

    /// Wrap any error raised while talking to the listing source.
    pub fn source(message: impl Into<String>) -> Self {
        AppError::SourceFetchError {
            message: message.into(),
            status_code: None,
        }
    }
}
