//! Error types for CryXmlB decoding and encoding.

use thiserror::Error;

use crate::Format;

/// Errors that can occur when converting between CryXmlB and XML.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Low-level buffer error.
    #[error("{0}")]
    Common(#[from] cryxmlb_common::Error),

    /// The first byte is neither `<` nor `C`.
    #[error("unknown file format (first byte: {first_byte:?})")]
    UnknownFormat { first_byte: Option<u8> },

    /// The data is already in the requested representation.
    #[error("already in {0} format")]
    AlreadyTargetFormat(Format),

    /// Missing the `CryXmlB\0` signature.
    #[error("invalid CryXmlB signature: expected 'CryXmlB\\0', got {actual:?}")]
    InvalidSignature { actual: Vec<u8> },

    /// A table, run or index does not fit inside its container.
    #[error("truncated or corrupt file: {what} at {offset} (length {len}) exceeds bound {size}")]
    TruncatedOrCorrupt {
        what: &'static str,
        offset: u64,
        len: u64,
        size: usize,
    },

    /// String offset past the end of the data blob.
    #[error("string offset {offset} out of bounds (string data size: {size})")]
    StringOffsetOutOfBounds { offset: u32, size: usize },

    /// No null terminator between a string offset and the end of the blob.
    #[error("string at offset {offset} is not terminated inside the string data")]
    UnterminatedString { offset: u32 },

    /// Node table is empty.
    #[error("document has no nodes")]
    EmptyDocument,

    /// More than one node claims to be the root.
    #[error("node {index} is a second root (parent index -1)")]
    MultipleRoots { index: usize },

    /// The child index table disagrees with the parent indices.
    #[error("child table of node {index} does not match parent links: {reason}")]
    ChildTableMismatch { index: usize, reason: String },

    /// An element without a name cannot be encoded.
    #[error("element at pre-order position {index} has an empty name")]
    EmptyElementName { index: usize },

    /// A NUL byte would end the string early in the string data.
    #[error("element at pre-order position {index} has a NUL character in its {what}")]
    EmbeddedNul { index: usize, what: &'static str },

    /// Too many attributes or children for a 16-bit count.
    #[error("element '{element}' has {count} {what}, the format allows at most {max}")]
    TooManyEntries {
        element: String,
        what: &'static str,
        count: usize,
        max: usize,
    },

    /// Encoded output would not fit 32-bit offsets.
    #[error("encoded {what} exceeds the 32-bit limit of the format")]
    TooLarge { what: &'static str },

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Malformed XML text.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// XML writing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// A table allocation failed.
    #[error("allocation failed: {0}")]
    AllocationFailure(#[from] std::collections::TryReserveError),
}

impl Error {
    /// Whether the error means the conversion failed, as opposed to the
    /// informational [`Error::AlreadyTargetFormat`].
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::AlreadyTargetFormat(_))
    }
}

/// Result type for CryXmlB operations.
pub type Result<T> = std::result::Result<T, Error>;
