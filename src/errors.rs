//! Error types for the daybook application.
//!
//! This module defines custom error types that categorize different failures
//! that can occur during entry store operations.

use std::io;

use thiserror::Error;

/// The main error type for the daybook application.
#[derive(Error, Debug)]
pub enum DaybookError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The primary store rejected a write. The record may have been
    /// mirrored to the fallback store, but the caller must treat the
    /// operation as failed and warn that durability is degraded.
    #[error("Storage failed: {message}")]
    StorageFailed { message: String },

    /// Entry was not found when performing an operation that requires it.
    #[error("Entry not found: {id}")]
    EntryNotFound { id: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// file not found
    #[error("File not found: {file_path}")]
    FileNotFound { file_path: String },

    #[error("{message}")]
    EditorError { message: String },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}
