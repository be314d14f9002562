//! JSON Output Envelope Types
//!
//! This module defines the structured JSON output format for every `getpet` command.
//! Each command prints exactly one envelope, either a [`SuccessEnvelope`] or an
//! [`ErrorEnvelope`].
//!
//! # Output Contract
//! - Success: `{"ok": true, "command": "...", "data": {...}, "meta": {...}}`
//! - Error: `{"ok": false, "command": "...", "error": {"code": "...", "message": "..."}}`

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ShelterError;

/// Success envelope for command results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    /// Always true for success envelopes
    pub ok: bool,

    /// Command that was executed (cages, get, search, ...)
    pub command: String,

    /// Command-specific data
    pub data: T,

    /// Execution metadata
    pub meta: Metadata,
}

impl<T> SuccessEnvelope<T> {
    /// Create a new success envelope
    pub fn new(command: impl Into<String>, data: T, meta: Metadata) -> Self {
        Self {
            ok: true,
            command: command.into(),
            data,
            meta,
        }
    }
}

/// Error envelope for command failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always false for error envelopes
    pub ok: bool,

    /// Command that was attempted
    pub command: String,

    /// Error information
    pub error: ErrorInfo,
}

impl ErrorEnvelope {
    /// Create a new error envelope
    pub fn new(command: impl Into<String>, error: ErrorInfo) -> Self {
        Self {
            ok: false,
            command: command.into(),
            error,
        }
    }

    /// Create error envelope from `ShelterError`
    pub fn from_error(command: impl Into<String>, err: &ShelterError) -> Self {
        Self::new(command, ErrorInfo::new(err.error_code(), err.message()))
    }
}

/// Error information structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable error code (e.g., "MISSING_FIELD", "CONNECTION_FAILED")
    pub code: String,

    /// Human-readable error message
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Execution metadata included in all success responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Execution time in milliseconds
    pub execution_ms: u64,

    /// Number of records returned (for list results, None for other commands)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_returned: Option<usize>,
}

impl Metadata {
    /// Create new metadata with just execution time
    #[must_use]
    pub const fn new(execution_ms: u64) -> Self {
        Self {
            execution_ms,
            records_returned: None,
        }
    }

    /// Metadata for a command that started at `started`
    #[must_use]
    pub fn since(started: Instant) -> Self {
        Self::new(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX))
    }

    /// Attach a record count
    #[must_use]
    pub const fn with_records(mut self, records_returned: usize) -> Self {
        self.records_returned = Some(records_returned);
        self
    }
}
