//! Binary reader for bounds-checked parsing of byte slices.
//!
//! [`BinaryReader`] is an explicit cursor over a borrowed buffer. Every read
//! validates the requested range first, so a corrupt offset surfaces as an
//! [`Error`] instead of a panic or an out-of-bounds access.

use byteorder::{ByteOrder, LittleEndian};
use zerocopy::FromBytes;

use crate::{Error, Result};

/// A cursor that reads little-endian values from a byte slice without copying.
///
/// # Example
///
/// ```
/// use cryxmlb_common::BinaryReader;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0xFF, 0xFF, 0xFF, 0xFF];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_i32().unwrap(), 0x04030201);
/// assert_eq!(reader.read_i32().unwrap(), -1);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Create a new reader starting at a specific position.
    ///
    /// Fails if `position` is past the end of the buffer.
    pub fn new_at(data: &'a [u8], position: usize) -> Result<Self> {
        let mut reader = Self::new(data);
        reader.seek(position)?;
        Ok(reader)
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Seek to an absolute position. Seeking to the very end is allowed.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(Error::OutOfBounds {
                offset: position,
                len: 0,
                size: self.data.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    /// Borrow `len` bytes at an absolute `offset` without moving the cursor.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let end = offset.checked_add(len).filter(|&end| end <= self.data.len());
        match end {
            Some(end) => Ok(&self.data[offset..end]),
            None => Err(Error::OutOfBounds {
                offset,
                len,
                size: self.data.len(),
            }),
        }
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    /// Read a little-endian i32.
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_bytes(4).map(LittleEndian::read_i32)
    }

    /// Read a fixed-layout record using zerocopy.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: bytes.len(),
        })
    }

    /// Read the null-terminated string starting at an absolute `offset`.
    ///
    /// The cursor does not move. The terminator must occur before the end of
    /// the buffer.
    pub fn cstring_at(&self, offset: usize) -> Result<&'a str> {
        let tail = self.slice(offset, self.data.len().saturating_sub(offset))?;
        let end = memchr::memchr(0, tail).ok_or(Error::MissingNullTerminator { offset })?;
        std::str::from_utf8(&tail[..end]).map_err(Error::Utf8)
    }
}
