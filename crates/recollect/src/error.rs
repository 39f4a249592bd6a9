//! Error types for Recollect

use thiserror::Error;

/// Main error type for Recollect operations
#[derive(Error, Debug)]
pub enum RecollectError {
    /// Persisted snapshot is missing a required section or is internally inconsistent
    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// An operation referenced a domain that is not registered
    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for Recollect operations
pub type Result<T> = std::result::Result<T, RecollectError>;
