//! Error types for cryxmlb-common.

use thiserror::Error;

/// Low-level error raised while reading a byte buffer.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading sequentially.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// An absolute range does not lie inside the buffer.
    #[error("range {offset}..{offset}+{len} is outside the buffer (size: {size})")]
    OutOfBounds { offset: usize, len: usize, size: usize },

    /// Missing null terminator in string.
    #[error("string at offset {offset} is missing its null terminator")]
    MissingNullTerminator { offset: usize },

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
