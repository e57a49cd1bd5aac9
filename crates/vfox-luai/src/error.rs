//! Error types for the value codec.

use thiserror::Error;

/// Errors raised while converting between host data and [`crate::Value`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The value has a shape the codec cannot represent.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),
}

impl CodecError {
    /// Builds a [`CodecError::UnsupportedType`] for the given shape.
    pub fn unsupported(what: impl Into<String>) -> Self {
        CodecError::UnsupportedType(what.into())
    }
}

/// Result type for codec operations.
pub type CodecResult<T> = std::result::Result<T, CodecError>;
