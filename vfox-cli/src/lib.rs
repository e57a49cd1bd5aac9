//! vfox library
//!
//! This module exports the components of the `vfox` binary for testing
//! purposes.

pub mod config;
pub mod manager;

pub use config::Config;
pub use manager::{PluginListing, SdkArg, SdkInfo, SdkManager};
