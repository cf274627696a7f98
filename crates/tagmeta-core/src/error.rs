//! Error types for the tagmeta-core library.
//!
//! Structural problems found while deriving metadata are *not* reported
//! through this type: they are collected as [`Diagnostic`](crate::Diagnostic)s
//! and only become an [`Error`] when the caller escalates a
//! [`DiagnosticSet`](crate::DiagnosticSet).

use crate::diagnostics::DiagnosticKind;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tagmeta operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all tagmeta operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read an input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to decode an encoded class description
    #[error("failed to decode class description: {0}")]
    DescriptionDecode(#[from] prost::DecodeError),

    /// The decoded class description is structurally invalid
    #[error("invalid class description: {details}")]
    InvalidDescription {
        /// Detailed description of the issue
        details: String,
    },

    /// A class was requested that the class source does not know
    #[error("unknown class '{name}'")]
    UnknownClass {
        /// Name of the missing class
        name: String,
    },

    /// A fatal metadata diagnostic, escalated by the caller
    #[error("{kind} in '{class}': {message}")]
    Metadata {
        /// Class the diagnostic was reported against
        class: String,
        /// Category of the diagnostic
        kind: DiagnosticKind,
        /// Human readable message
        message: String,
    },

    /// Generator configuration failed validation
    #[error("invalid generator configuration: {reason}")]
    Config {
        /// Why the configuration was rejected
        reason: String,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new invalid description error
    pub fn invalid_description(details: impl Into<String>) -> Self {
        Self::InvalidDescription {
            details: details.into(),
        }
    }

    /// Creates a new unknown class error
    pub fn unknown_class(name: impl Into<String>) -> Self {
        Self::UnknownClass { name: name.into() }
    }

    /// Creates a new configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Returns true if the error came from analysing a class rather than
    /// from reading or decoding input
    pub fn is_metadata(&self) -> bool {
        matches!(self, Self::Metadata { .. })
    }
}
