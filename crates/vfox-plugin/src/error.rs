//! Error types for plugin loading and hook calls.

use thiserror::Error;
use vfox_luai::CodecError;
use vfox_runtime::RuntimeError;

/// Errors that can occur while loading or calling a plugin.
#[derive(Error, Debug)]
pub enum PluginError {
    /// The plugin could not be loaded or does not satisfy the contract.
    #[error("Failed to load plugin: {0}")]
    Load(String),

    /// The runtime failed, including errors raised by hook code.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// A context or result could not be converted.
    #[error("Invalid hook data: {0}")]
    Codec(#[from] CodecError),

    /// A hook returned data that breaks its contract.
    #[error(transparent)]
    Contract(#[from] HookContractError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Violations of a hook's result contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookContractError {
    /// An install result carries no version.
    #[error("no version number provided")]
    MissingVersion,

    /// An additional file carries no name.
    #[error("additional file no name provided")]
    MissingName,

    /// `EnvKeys` returned nothing to set.
    #[error("no environment variables provided")]
    NoEnvironmentVariables,
}

/// Result type for plugin operations.
pub type PluginResult<T> = std::result::Result<T, PluginError>;
