//! Error types for composefn.
//!
//! Library crates use [`ComposeFnError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all composefn operations.
#[derive(Debug, thiserror::Error)]
pub enum ComposeFnError {
    /// A required identifier, name, or GVK was empty.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A value could not be converted to or from the structured-value form.
    #[error("cannot convert {type_name}: {message}")]
    Conversion {
        type_name: &'static str,
        message: String,
    },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Malformed input document or command-line argument.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ComposeFnError>;

impl ComposeFnError {
    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a conversion error naming the offending type.
    pub fn conversion(type_name: &'static str, msg: impl Into<String>) -> Self {
        Self::Conversion {
            type_name,
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is a [`ComposeFnError::Validation`].
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
