//! The shared string data blob.
//!
//! Every tag name, text content, attribute name and attribute value lives in
//! one buffer of null-terminated strings, addressed by byte offset.

use std::collections::HashMap;

use cryxmlb_common::BinaryReader;

use crate::{Error, Result};

/// Read-only view of the string data of a parsed document.
#[derive(Debug, Clone, Copy)]
pub struct StringData<'a> {
    bytes: &'a [u8],
}

impl<'a> StringData<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Size of the string data in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Resolve the null-terminated string starting at `offset`.
    pub fn get(&self, offset: u32) -> Result<&'a str> {
        let start = offset as usize;
        if start >= self.bytes.len() {
            return Err(Error::StringOffsetOutOfBounds {
                offset,
                size: self.bytes.len(),
            });
        }

        BinaryReader::new(self.bytes)
            .cstring_at(start)
            .map_err(|e| match e {
                cryxmlb_common::Error::MissingNullTerminator { .. } => Error::UnterminatedString { offset },
                other => other.into(),
            })
    }
}

/// Growing string data for the encoder.
///
/// By default every [`add`](StringTable::add) appends a fresh copy, so the
/// same text may appear at several offsets. With interning enabled identical
/// strings share the offset of their first occurrence.
#[derive(Debug, Default)]
pub struct StringTable {
    bytes: Vec<u8>,
    interned: Option<HashMap<String, u32>>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table that stores each distinct string once.
    pub fn interning() -> Self {
        Self {
            bytes: Vec::new(),
            interned: Some(HashMap::new()),
        }
    }

    /// Append a string and return the offset of its first byte.
    pub fn add(&mut self, s: &str) -> Result<u32> {
        if let Some(&offset) = self.interned.as_ref().and_then(|map| map.get(s)) {
            return Ok(offset);
        }

        let offset = u32::try_from(self.bytes.len()).map_err(|_| Error::TooLarge { what: "string data" })?;
        self.bytes.extend_from_slice(s.as_bytes());
        self.bytes.push(0);

        if let Some(map) = self.interned.as_mut() {
            map.insert(s.to_owned(), offset);
        }
        Ok(offset)
    }

    /// Current size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
