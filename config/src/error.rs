//! Error types for configuration operations

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value for \"{key}\": {message}")]
    InvalidValue { key: String, message: String },

    #[error("Unknown reason \"{reason}\" for \"{key}\"")]
    InvalidReason { key: String, reason: String },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Section not found: {0}")]
    SectionNotFound(String),

    #[error("Index {index} out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Substitution error in \"{text}\": {message}")]
    Substitution { text: String, message: String },

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),
}

impl ConfigError {
    /// Whether the error signals a broken internal invariant rather than bad input
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConfigError::InvariantViolation(_))
    }
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
