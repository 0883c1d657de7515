//! CryXmlB attribute structure.

use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// An attribute in a CryXmlB node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct CryXmlAttribute {
    /// Offset into the string data for the attribute name.
    pub name_offset: U32,
    /// Offset into the string data for the attribute value.
    pub value_offset: U32,
}

impl CryXmlAttribute {
    /// Size of one attribute record in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn new(name_offset: u32, value_offset: u32) -> Self {
        Self {
            name_offset: U32::new(name_offset),
            value_offset: U32::new(value_offset),
        }
    }
}
