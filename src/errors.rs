/// # Piletas Sync Errors
/// This module defines the `PiletasError` enum, which encapsulates all potential errors that can occur within the cooling-bay service.
/// The enum variants provide specific error types for different components and operations, facilitating clear error handling and reporting throughout the application.


use thiserror::Error;
use sqlx_oldapi::Error as SqlxError;
use std::io;

#[derive(Error, Debug)]
pub enum PiletasError {
    /// Represents errors originating from database interactions.
    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    /// Represents malformed or out-of-range caller input, reported before any mutation.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Represents a point lookup for a timer identifier that has no active row.
    #[error("Cronómetro no encontrado: {0}")]
    TimerNotFound(String),

    /// Represents a grant attempt against a bay that another caller occupied first.
    #[error("Bay conflict: {0}")]
    BayConflict(String),

    /// Represents failures talking to the external Shipping API (transport or non-2xx).
    #[error("Shipping API error ({status:?}): {message}")]
    ShippingApiError {
        status: Option<u16>,
        message: String,
    },

    /// Represents errors arising from misconfigurations or invalid settings.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Represents errors that occur during serialization or deserialization of data.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Represents errors during the initialization of the logging system.
    #[error("Logging initialization error: {0}")]
    LoggingError(String),
}

impl From<config::ConfigError> for PiletasError {
    fn from(err: config::ConfigError) -> Self {
        PiletasError::ConfigError(err.to_string())
    }
}

impl From<reqwest::Error> for PiletasError {
    fn from(err: reqwest::Error) -> Self {
        PiletasError::ShippingApiError {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for PiletasError {
    fn from(err: url::ParseError) -> Self {
        PiletasError::ConfigError(err.to_string())
    }
}

pub type PiletasResult<T> = Result<T, PiletasError>;

impl PiletasError {
    /// Whether the error is the caller's fault rather than an infrastructure failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, PiletasError::ValidationError(_))
    }
}
