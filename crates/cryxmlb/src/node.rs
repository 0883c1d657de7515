//! CryXmlB node structure.

use std::ops::Range;

use zerocopy::little_endian::{I32, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// A node in the CryXmlB tree.
///
/// Nodes are stored in a flat array in pre-order and reference each other by
/// index. Attributes and child indices are contiguous runs in their own
/// tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct CryXmlNode {
    /// Offset into the string data for the tag name.
    pub name_offset: U32,
    /// Offset into the string data for the text content.
    pub content_offset: U32,
    /// Number of attributes on this node.
    pub attribute_count: U16,
    /// Number of child nodes.
    pub child_count: U16,
    /// Parent node index (-1 for root).
    pub parent_index: I32,
    /// Index of the first attribute in the attribute table.
    pub first_attribute_index: I32,
    /// Index of the first slot in the child index table.
    pub first_child_index: I32,
    /// Always zero.
    pub reserved: U32,
}

impl CryXmlNode {
    /// Size of one node record in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Parent index, or `None` for the root.
    pub fn parent(&self) -> Option<i32> {
        match self.parent_index.get() {
            -1 => None,
            parent => Some(parent),
        }
    }

    /// Slots of this node's attributes in the attribute table.
    ///
    /// `None` if the start index is negative.
    pub fn attribute_range(&self) -> Option<Range<usize>> {
        run(self.first_attribute_index, self.attribute_count)
    }

    /// Slots of this node's children in the child index table.
    pub fn child_range(&self) -> Option<Range<usize>> {
        run(self.first_child_index, self.child_count)
    }
}

fn run(first: I32, count: U16) -> Option<Range<usize>> {
    let start = usize::try_from(first.get()).ok()?;
    Some(start..start + usize::from(count.get()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_layout() {
        assert_eq!(CryXmlNode::SIZE, 28);
    }

    #[test]
    fn test_ranges() {
        let node = CryXmlNode {
            attribute_count: U16::new(2),
            child_count: U16::new(3),
            parent_index: I32::new(-1),
            first_attribute_index: I32::new(5),
            first_child_index: I32::new(-4),
            ..Default::default()
        };

        assert_eq!(node.parent(), None);
        assert_eq!(node.attribute_range(), Some(5..7));
        assert_eq!(node.child_range(), None);
    }
}
