//! CryXmlB decoder.

use std::collections::HashSet;
use std::ops::Range;

use cryxmlb_common::{BinaryReader, FromBytes};
use tracing::debug;

use crate::string_table::StringData;
use crate::{CryXmlAttribute, CryXmlHeader, CryXmlNode, Element, Error, Result};

/// Parsed CryXmlB document.
///
/// Holds the decoded node, attribute and child tables. The string data is
/// borrowed from the input buffer, not copied.
#[derive(Debug)]
pub struct CryXml<'a> {
    header: CryXmlHeader,
    nodes: Vec<CryXmlNode>,
    attributes: Vec<CryXmlAttribute>,
    child_indices: Vec<i32>,
    strings: StringData<'a>,
}

impl<'a> CryXml<'a> {
    /// Check if data is a CryXmlB file by checking the signature.
    pub fn is_cryxml(data: &[u8]) -> bool {
        data.starts_with(CryXmlHeader::MAGIC)
    }

    /// Parse a CryXmlB file from bytes.
    ///
    /// Every table declared by the header is checked against the buffer
    /// before it is read.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if !Self::is_cryxml(data) {
            return Err(Error::InvalidSignature {
                actual: data[..CryXmlHeader::MAGIC_LEN.min(data.len())].to_vec(),
            });
        }

        let size = data.len();
        let mut reader = BinaryReader::new_at(data, CryXmlHeader::MAGIC_LEN)?;
        let header: CryXmlHeader = reader.read_struct().map_err(|_| Error::TruncatedOrCorrupt {
            what: "header",
            offset: CryXmlHeader::MAGIC_LEN as u64,
            len: CryXmlHeader::SIZE as u64,
            size,
        })?;

        if header.file_size.get() as usize != size {
            debug!(declared = header.file_size.get(), actual = size, "file size field does not match buffer");
        }

        let node_range = table_range(
            "node table",
            CryXmlHeader::table_range(header.node_table_position, header.node_count, CryXmlNode::SIZE),
            size,
        )?;
        let attribute_range = table_range(
            "attribute table",
            CryXmlHeader::table_range(
                header.attribute_table_position,
                header.attribute_count,
                CryXmlAttribute::SIZE,
            ),
            size,
        )?;
        let child_range = table_range(
            "child index table",
            CryXmlHeader::table_range(header.child_table_position, header.child_count, 4),
            size,
        )?;
        let string_range = table_range(
            "string data",
            CryXmlHeader::table_range(header.string_data_position, header.string_data_size, 1),
            size,
        )?;

        let nodes = read_records::<CryXmlNode>(data, node_range)?;
        let attributes = read_records::<CryXmlAttribute>(data, attribute_range)?;

        let mut child_indices = Vec::new();
        child_indices.try_reserve_exact(header.child_count.get() as usize)?;
        let mut reader = BinaryReader::new(&data[child_range]);
        while !reader.is_empty() {
            child_indices.push(reader.read_i32()?);
        }

        debug!(
            nodes = nodes.len(),
            attributes = attributes.len(),
            children = child_indices.len(),
            string_bytes = string_range.len(),
            "parsed CryXmlB tables"
        );

        Ok(Self {
            header,
            nodes,
            attributes,
            child_indices,
            strings: StringData::new(&data[string_range]),
        })
    }

    pub fn header(&self) -> &CryXmlHeader {
        &self.header
    }

    pub fn nodes(&self) -> &[CryXmlNode] {
        &self.nodes
    }

    pub fn attributes(&self) -> &[CryXmlAttribute] {
        &self.attributes
    }

    pub fn child_indices(&self) -> &[i32] {
        &self.child_indices
    }

    /// Get a string from the string data by offset.
    pub fn get_string(&self, offset: u32) -> Result<&'a str> {
        self.strings.get(offset)
    }

    /// Every distinct string referenced by a node or attribute.
    pub fn all_strings(&self) -> Result<HashSet<&'a str>> {
        let mut strings = HashSet::new();

        for node in &self.nodes {
            strings.insert(self.get_string(node.name_offset.get())?);
            strings.insert(self.get_string(node.content_offset.get())?);
        }

        for attr in &self.attributes {
            strings.insert(self.get_string(attr.name_offset.get())?);
            strings.insert(self.get_string(attr.value_offset.get())?);
        }

        Ok(strings)
    }

    /// Get the root node.
    pub fn root(&self) -> Option<&CryXmlNode> {
        self.nodes.first()
    }

    /// Get a node by index.
    pub fn node(&self, index: usize) -> Option<&CryXmlNode> {
        self.nodes.get(index)
    }

    /// Get the attributes of a node.
    pub fn node_attributes(&self, node: &CryXmlNode) -> Result<&[CryXmlAttribute]> {
        let range = node.attribute_range();
        range
            .as_ref()
            .and_then(|range| self.attributes.get(range.clone()))
            .ok_or_else(|| {
                corrupt_run(
                    "attribute run",
                    node.first_attribute_index.get(),
                    node.attribute_count.get(),
                    self.attributes.len(),
                )
            })
    }

    /// Get the child index table entries of a node.
    pub fn child_slots(&self, node: &CryXmlNode) -> Result<&[i32]> {
        let range = node.child_range();
        range
            .as_ref()
            .and_then(|range| self.child_indices.get(range.clone()))
            .ok_or_else(|| {
                corrupt_run(
                    "child run",
                    node.first_child_index.get(),
                    node.child_count.get(),
                    self.child_indices.len(),
                )
            })
    }

    /// Get the children of a node, as listed in the child index table.
    pub fn children(&self, node: &CryXmlNode) -> Result<Vec<&CryXmlNode>> {
        self.child_slots(node)?
            .iter()
            .map(|&index| {
                usize::try_from(index)
                    .ok()
                    .and_then(|i| self.nodes.get(i))
                    .ok_or(Error::TruncatedOrCorrupt {
                        what: "child index",
                        offset: index as u64,
                        len: 1,
                        size: self.nodes.len(),
                    })
            })
            .collect()
    }

    /// Parent of every node, validated against the pre-order layout.
    ///
    /// The root maps to `None`. Every other node must name a parent that
    /// precedes it in the node table; the bound reported for a bad parent is
    /// the node's own index.
    fn parent_links(&self) -> Result<Vec<Option<usize>>> {
        if self.nodes.is_empty() {
            return Err(Error::EmptyDocument);
        }

        let mut links = Vec::new();
        links.try_reserve_exact(self.nodes.len())?;
        for (index, node) in self.nodes.iter().enumerate() {
            let link = match node.parent() {
                None if index == 0 => None,
                None => return Err(Error::MultipleRoots { index }),
                Some(parent) => match usize::try_from(parent) {
                    Ok(parent) if parent < index => Some(parent),
                    _ => {
                        return Err(Error::TruncatedOrCorrupt {
                            what: "parent index",
                            offset: i64::from(parent) as u64,
                            len: 1,
                            size: index,
                        })
                    }
                },
            };
            links.push(link);
        }
        Ok(links)
    }

    /// Cross-check the child index table against the parent indices.
    ///
    /// For every node, its run in the child index table must list exactly
    /// the nodes that name it as parent, in table order.
    pub fn verify_child_table(&self) -> Result<()> {
        let links = self.parent_links()?;

        let mut expected: Vec<Vec<i32>> = vec![Vec::new(); self.nodes.len()];
        for (index, link) in links.iter().enumerate() {
            if let Some(parent) = *link {
                expected[parent].push(index as i32);
            }
        }

        for (index, node) in self.nodes.iter().enumerate() {
            let slots = self.child_slots(node).map_err(|e| Error::ChildTableMismatch {
                index,
                reason: e.to_string(),
            })?;
            if slots != expected[index].as_slice() {
                return Err(Error::ChildTableMismatch {
                    index,
                    reason: format!("table lists {:?}, parent links give {:?}", slots, expected[index]),
                });
            }
        }
        Ok(())
    }

    /// Build the element tree.
    ///
    /// Parent linkage follows each node's `parent_index`; siblings keep their
    /// node table order.
    pub fn to_element(&self) -> Result<Element> {
        let links = self.parent_links()?;

        let mut elements: Vec<Option<Element>> = Vec::new();
        elements.try_reserve_exact(self.nodes.len())?;
        for node in &self.nodes {
            let mut element = Element::new(self.get_string(node.name_offset.get())?);
            element.text = self.get_string(node.content_offset.get())?.to_owned();

            let attributes = self.node_attributes(node)?;
            element.attributes.try_reserve_exact(attributes.len())?;
            for attr in attributes {
                element.attributes.push((
                    self.get_string(attr.name_offset.get())?.to_owned(),
                    self.get_string(attr.value_offset.get())?.to_owned(),
                ));
            }
            elements.push(Some(element));
        }

        // Descendants always follow their ancestors, so walking backwards
        // moves every subtree into its parent after the subtree is complete.
        for index in (1..elements.len()).rev() {
            let Some(parent) = links[index] else { continue };
            if let Some(mut element) = elements[index].take() {
                element.children.reverse();
                if let Some(parent) = elements[parent].as_mut() {
                    parent.children.push(element);
                }
            }
        }

        let mut root = elements.into_iter().next().flatten().ok_or(Error::EmptyDocument)?;
        root.children.reverse();
        Ok(root)
    }

    /// Convert to XML string.
    #[cfg(feature = "xml")]
    pub fn to_xml_string(&self) -> Result<String> {
        self.to_element()?.to_xml_string()
    }

    /// Write XML to a writer.
    #[cfg(feature = "xml")]
    pub fn write_xml<W: std::io::Write>(&self, writer: W) -> Result<()> {
        self.to_element()?.write_xml(writer)
    }
}

/// Convert a 64-bit table extent into a range inside a buffer of `size`.
fn table_range(what: &'static str, (start, end): (u64, u64), size: usize) -> Result<Range<usize>> {
    if end > size as u64 {
        return Err(Error::TruncatedOrCorrupt {
            what,
            offset: start,
            len: end - start,
            size,
        });
    }
    Ok(start as usize..end as usize)
}

fn read_records<T: FromBytes>(data: &[u8], range: Range<usize>) -> Result<Vec<T>> {
    let count = range.len() / std::mem::size_of::<T>();
    let mut records = Vec::new();
    records.try_reserve_exact(count)?;

    let mut reader = BinaryReader::new(&data[range]);
    for _ in 0..count {
        records.push(reader.read_struct::<T>()?);
    }
    Ok(records)
}

fn corrupt_run(what: &'static str, first: i32, count: u16, size: usize) -> Error {
    Error::TruncatedOrCorrupt {
        what,
        offset: first as u64,
        len: u64::from(count),
        size,
    }
}
