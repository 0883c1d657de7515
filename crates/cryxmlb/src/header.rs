//! CryXmlB header structure.

use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// CryXmlB file header.
///
/// This structure follows the 8-byte signature "CryXmlB\0" at the start of
/// the file. Every position is an absolute byte offset from the start of the
/// file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct CryXmlHeader {
    /// Total file size, signature included.
    pub file_size: U32,
    /// Position of node table in file.
    pub node_table_position: U32,
    /// Number of nodes.
    pub node_count: U32,
    /// Position of attribute table in file.
    pub attribute_table_position: U32,
    /// Number of attributes.
    pub attribute_count: U32,
    /// Position of child index table in file.
    pub child_table_position: U32,
    /// Number of child indices.
    pub child_count: U32,
    /// Position of string data in file.
    pub string_data_position: U32,
    /// Size of string data in bytes.
    pub string_data_size: U32,
}

impl CryXmlHeader {
    /// The signature at the start of a CryXmlB file.
    pub const MAGIC: &'static [u8; 8] = b"CryXmlB\0";

    /// Size of the signature.
    pub const MAGIC_LEN: usize = 8;

    /// Size of the header fields following the signature.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Offset of the first table when tables directly follow the header.
    pub const TABLES_START: usize = Self::MAGIC_LEN + Self::SIZE;

    /// Byte range `(start, end)` occupied by `count` records of
    /// `record_size` bytes at `position`.
    ///
    /// Computed in 64 bits so that corrupt counts cannot overflow.
    pub fn table_range(position: U32, count: U32, record_size: usize) -> (u64, u64) {
        let start = u64::from(position.get());
        let len = u64::from(count.get()) * record_size as u64;
        (start, start + len)
    }
}
