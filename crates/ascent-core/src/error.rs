//! Core error types for ascent-core.
//!
//! Two kinds of failure matter to the engine: a rejected execution
//! ([`ValidationError`]), which is recoverable and leaves state untouched, and
//! an unknown domain name ([`CoreError::UnknownDomain`]), which is a caller
//! bug. Everything else is storage or configuration plumbing.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for ascent-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A domain name outside the fixed set of seven
    #[error("Unknown domain: '{0}'")]
    UnknownDomain(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Snapshot restore errors
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Snapshot restore errors.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Snapshot written by a newer build
    #[error("Snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Stored snapshot is not valid JSON for the snapshot schema
    #[error("Stored snapshot is corrupt: {0}")]
    Corrupt(String),
}

/// Reasons an execution payload is rejected.
///
/// The `Display` text is what callers see as the rejection reason.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required field absent
    #[error("missing required field '{0}'")]
    MissingField(String),

    /// Invalid value
    #[error("invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Empty collection
    #[error("'{0}' must not be empty")]
    EmptyCollection(String),

    /// Domain closed to submissions while strict mode is active
    #[error("strict mode: submissions for '{domain}' are blocked")]
    Blocked { domain: String },

    /// Payload could not be read as the domain's schema
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl ValidationError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
