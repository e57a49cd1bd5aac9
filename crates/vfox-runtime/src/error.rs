//! Error types for the Lua runtime.

use std::time::Duration;
use thiserror::Error;
use vfox_luai::CodecError;

/// Errors that can occur while hosting a plugin.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The interpreter rejected a chunk or a host binding.
    #[error("Lua error: {0}")]
    Lua(String),

    /// A hook raised an error while running.
    #[error("[{function}] failed: {message}")]
    Invocation { function: String, message: String },

    /// A hook ran past its deadline and was interrupted.
    #[error("[{function}] did not finish within {timeout:?}")]
    Timeout { function: String, timeout: Duration },

    /// A name is bound to a value of the wrong type.
    #[error("[{name}] should be a {expected}, got {found}")]
    UnexpectedType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A value could not cross the boundary.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl From<mlua::Error> for RuntimeError {
    fn from(e: mlua::Error) -> Self {
        RuntimeError::Lua(e.to_string())
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync + std::error::Error + 'static>() {}

    #[test]
    fn test_runtime_error_is_send_and_sync() {
        assert_send_sync::<RuntimeError>();
    }

    #[test]
    fn test_lua_error_keeps_message() {
        let err = RuntimeError::from(mlua::Error::RuntimeError("bad chunk".to_string()));
        assert!(matches!(&err, RuntimeError::Lua(msg) if msg.contains("bad chunk")));
        assert!(err.to_string().starts_with("Lua error:"));
    }
}
