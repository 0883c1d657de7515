//! Common utilities for the CryXmlB codec.
//!
//! - [`BinaryReader`] - Bounds-checked, zero-copy reading from byte slices
//! - [`Error`] - Low-level reading errors shared by the codec crates

mod error;
mod reader;

pub use error::{Error, Result};
pub use reader::BinaryReader;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};
