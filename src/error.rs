//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout GetPet.
//! All errors are structured and map to specific error codes for JSON output.
//!
//! # Error Categories
//! - `ConnectionFailed`: The store could not be opened
//! - `Persistence`: A statement failed to prepare or execute (wraps the driver error)
//! - `UnknownEnumValue`: A stored string matches no enum member
//! - `MissingField` / `InvalidField`: An `Animal` could not be built
//! - `WriteFailed`: An insert affected zero rows
//! - `InvalidInput`: Malformed request at the CLI or RPC boundary
//! - `ConfigError`: Configuration file errors
//! - `ServiceUnavailable`: The worker owning the connection has stopped
//!
//! Not-found conditions are never errors. Lookups return `None`, updates and
//! deletes return `false`.

use thiserror::Error;

/// Main error type for GetPet operations
#[derive(Error, Debug)]
pub enum ShelterError {
    /// The database could not be opened
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A statement failed to prepare or execute
    #[error("Persistence error: {context}: {source}")]
    Persistence {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A stored string does not name any member of the enum
    #[error("Unknown {kind} value: '{value}'")]
    UnknownEnumValue { kind: &'static str, value: String },

    /// A required field was not set before building a record
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A field was set to a value the record model cannot store
    #[error("Invalid value for field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// A write statement completed but changed nothing
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Invalid input or missing required parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error (file unreadable, invalid JSON, etc.)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The persistence worker is no longer accepting commands
    #[error("Shelter service is unavailable")]
    ServiceUnavailable,
}

impl ShelterError {
    /// Convert error to error code string for JSON output
    ///
    /// Error codes are stable and suitable for programmatic handling.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::Persistence { .. } => "PERSISTENCE_ERROR",
            Self::UnknownEnumValue { .. } => "UNKNOWN_ENUM_VALUE",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidField { .. } => "INVALID_FIELD",
            Self::WriteFailed(_) => "WRITE_FAILED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    /// Get human-readable error message
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Whether the error was caused by the caller's input rather than the store
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_) | Self::InvalidField { .. } | Self::InvalidInput(_)
        )
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Wrap a driver error with a description of the failed operation
    pub fn persistence(context: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Persistence {
            context: context.into(),
            source,
        }
    }

    /// Create an unknown enum value error
    pub fn unknown_enum_value(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownEnumValue {
            kind,
            value: value.into(),
        }
    }

    /// Create an invalid field error
    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// Create a write failed error
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::WriteFailed(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }
}

/// Result type alias for GetPet operations
pub type Result<T> = std::result::Result<T, ShelterError>;
