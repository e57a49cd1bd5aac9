//! # vfox-luai
//!
//! The value bridge between vfox and its Lua plugins.
//!
//! This crate provides:
//! - [`Value`], an interpreter-independent tree mirroring what a Lua table
//!   can hold
//! - [`Marshal`] for turning host data into that tree
//! - [`Unmarshal`] and [`Assign`] for reading hook results back into host
//!   records
//! - The [`record!`] macro, which declares a record together with its
//!   field-to-key mapping
//!
//! ## Conventions
//!
//! Sequences are tables keyed `1..=n`, following Lua. Records and string
//! maps are tables keyed by strings. Coercion on the way back is driven by
//! the type found in the table, not by the type of the target field; entries
//! that do not fit are skipped rather than reported.
//!
//! Numbers read into integer fields are truncated toward zero, so a plugin
//! returning `1.9` for an integer field produces `1`.

pub mod error;
pub mod marshal;
mod record;
pub mod unmarshal;
pub mod value;

pub use error::{CodecError, CodecResult};
pub use marshal::Marshal;
pub use unmarshal::{Assign, Unmarshal};
pub use value::{Key, Table, Value};

#[doc(hidden)]
pub use tracing as __tracing;
