//! Builder for constructing CryXmlB documents.
//!
//! The builder flattens an [`Element`] tree into the four CryXmlB tables in
//! pre-order and lays them out behind the header:
//!
//! `signature | header | nodes | attributes | child indices | string data`

use tracing::debug;
use zerocopy::little_endian::{I32, U16, U32};
use zerocopy::IntoBytes;

use crate::string_table::StringTable;
use crate::{CryXmlAttribute, CryXmlHeader, CryXmlNode, Element, Error, Result};

/// Largest attribute or child count a node may carry.
pub const MAX_ENTRIES: usize = i16::MAX as usize;

/// Builder for constructing CryXmlB documents.
///
/// # Example
///
/// ```
/// use cryxmlb::{CryXml, CryXmlBuilder, Element};
///
/// let root = Element::new("Material")
///     .attr("Name", "MyMaterial")
///     .child(Element::new("Textures")
///         .child(Element::new("Texture")
///             .attr("Map", "Diffuse")
///             .attr("File", "texture.dds")));
///
/// let bytes = CryXmlBuilder::new(root.clone()).build().unwrap();
/// assert_eq!(CryXml::parse(&bytes).unwrap().to_element().unwrap(), root);
/// ```
#[derive(Debug, Clone)]
pub struct CryXmlBuilder {
    root: Element,
    dedup_strings: bool,
}

impl CryXmlBuilder {
    /// Create a new builder with the given root element.
    pub fn new(root: Element) -> Self {
        Self {
            root,
            dedup_strings: false,
        }
    }

    /// Store each distinct string once instead of once per occurrence.
    pub fn dedup_strings(mut self, dedup: bool) -> Self {
        self.dedup_strings = dedup;
        self
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Build the CryXmlB binary representation.
    pub fn build(&self) -> Result<Vec<u8>> {
        validate(&self.root)?;

        let strings = if self.dedup_strings {
            StringTable::interning()
        } else {
            StringTable::new()
        };
        let mut tables = Tables {
            nodes: Vec::new(),
            attributes: Vec::new(),
            child_indices: Vec::new(),
            strings,
        };
        tables.flatten(&self.root)?;

        debug!(
            nodes = tables.nodes.len(),
            attributes = tables.attributes.len(),
            string_bytes = tables.strings.len(),
            "flattened element tree"
        );

        tables.write()
    }
}

/// Reject trees the format cannot represent before any table is built.
fn validate(root: &Element) -> Result<()> {
    for (index, element) in root.iter().enumerate() {
        if element.name.is_empty() {
            return Err(Error::EmptyElementName { index });
        }
        let strings = [("name", &element.name), ("text", &element.text)]
            .into_iter()
            .chain(element.attributes.iter().flat_map(|(name, value)| {
                [("attribute name", name), ("attribute value", value)]
            }));
        for (what, s) in strings {
            if s.contains('\0') {
                return Err(Error::EmbeddedNul { index, what });
            }
        }
        for (what, count) in [
            ("attributes", element.attributes.len()),
            ("children", element.children.len()),
        ] {
            if count > MAX_ENTRIES {
                return Err(Error::TooManyEntries {
                    element: element.name.clone(),
                    what,
                    count,
                    max: MAX_ENTRIES,
                });
            }
        }
    }
    Ok(())
}

/// The four tables under construction.
#[derive(Debug)]
struct Tables {
    nodes: Vec<CryXmlNode>,
    attributes: Vec<CryXmlAttribute>,
    child_indices: Vec<i32>,
    strings: StringTable,
}

impl Tables {
    /// Flatten the tree in pre-order.
    ///
    /// Each node's child slots are reserved when the node is added and
    /// filled in as its children are reached. The walk keeps its own stack,
    /// so nesting depth is bounded only by memory.
    fn flatten(&mut self, root: &Element) -> Result<()> {
        let (root_index, root_slots) = self.push_node(root, -1)?;

        let mut stack = vec![(root_index, root_slots, root.children.iter().enumerate())];
        while let Some((parent_index, first_slot, children)) = stack.last_mut() {
            let (parent_index, first_slot) = (*parent_index, *first_slot);
            let Some((slot, child)) = children.next() else {
                stack.pop();
                continue;
            };

            let (child_index, child_slots) = self.push_node(child, parent_index)?;
            self.child_indices[first_slot + slot] = child_index;
            stack.push((child_index, child_slots, child.children.iter().enumerate()));
        }
        Ok(())
    }

    /// Append one node with its strings and attributes, and reserve its
    /// child slots. Returns the node index and the first reserved slot.
    fn push_node(&mut self, element: &Element, parent_index: i32) -> Result<(i32, usize)> {
        let node_index = table_index(self.nodes.len(), "node table")?;

        let name_offset = self.strings.add(&element.name)?;
        let content_offset = self.strings.add(&element.text)?;

        let first_attribute_index = table_index(self.attributes.len(), "attribute table")?;
        for (name, value) in &element.attributes {
            let name_offset = self.strings.add(name)?;
            let value_offset = self.strings.add(value)?;
            self.attributes.push(CryXmlAttribute::new(name_offset, value_offset));
        }

        let child_start = self.child_indices.len();
        let first_child_index = table_index(child_start, "child index table")?;

        // Counts were bounded by `validate`.
        self.nodes.push(CryXmlNode {
            name_offset: U32::new(name_offset),
            content_offset: U32::new(content_offset),
            attribute_count: U16::new(element.attributes.len() as u16),
            child_count: U16::new(element.children.len() as u16),
            parent_index: I32::new(parent_index),
            first_attribute_index: I32::new(first_attribute_index),
            first_child_index: I32::new(first_child_index),
            reserved: U32::new(0),
        });
        self.child_indices.resize(child_start + element.children.len(), 0);

        Ok((node_index, child_start))
    }

    /// Lay out the header and tables.
    fn write(self) -> Result<Vec<u8>> {
        let node_table_position = CryXmlHeader::TABLES_START as u64;
        let attribute_table_position = node_table_position + (self.nodes.len() * CryXmlNode::SIZE) as u64;
        let child_table_position =
            attribute_table_position + (self.attributes.len() * CryXmlAttribute::SIZE) as u64;
        let string_data_position = child_table_position + (self.child_indices.len() * 4) as u64;
        let file_size = string_data_position + self.strings.len() as u64;

        let header = CryXmlHeader {
            file_size: position(file_size)?,
            node_table_position: position(node_table_position)?,
            node_count: position(self.nodes.len() as u64)?,
            attribute_table_position: position(attribute_table_position)?,
            attribute_count: position(self.attributes.len() as u64)?,
            child_table_position: position(child_table_position)?,
            child_count: position(self.child_indices.len() as u64)?,
            string_data_position: position(string_data_position)?,
            string_data_size: position(self.strings.len() as u64)?,
        };

        let mut output = Vec::new();
        output.try_reserve_exact(file_size as usize)?;

        output.extend_from_slice(CryXmlHeader::MAGIC);
        output.extend_from_slice(header.as_bytes());
        output.extend_from_slice(self.nodes.as_bytes());
        output.extend_from_slice(self.attributes.as_bytes());
        for idx in &self.child_indices {
            output.extend_from_slice(&idx.to_le_bytes());
        }
        output.extend_from_slice(self.strings.as_bytes());

        debug_assert_eq!(output.len() as u64, file_size);
        Ok(output)
    }
}

fn table_index(len: usize, what: &'static str) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::TooLarge { what })
}

fn position(value: u64) -> Result<U32> {
    u32::try_from(value)
        .map(U32::new)
        .map_err(|_| Error::TooLarge { what: "file" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CryXml;

    fn read_i32(bytes: &[u8], offset: usize) -> i32 {
        i32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn test_builder_basic() {
        let bytes = CryXmlBuilder::new(Element::new("Root").attr("version", "1.0"))
            .build()
            .unwrap();

        assert_eq!(&bytes[..8], b"CryXmlB\0");
        assert_eq!(read_i32(&bytes, 8) as usize, bytes.len());

        let parsed = CryXml::parse(&bytes).unwrap();
        let root = parsed.root().unwrap();
        assert_eq!(parsed.get_string(root.name_offset.get()).unwrap(), "Root");
    }

    #[test]
    fn test_concrete_layout() {
        // <root attr="v"><child>text</child></root>
        let root = Element::new("root")
            .attr("attr", "v")
            .child(Element::new("child").text("text"));
        let bytes = CryXmlBuilder::new(root).build().unwrap();

        // Header: size, then (offset, count) for nodes, attributes, children, strings.
        let strings: &[u8] = b"root\0\0attr\0v\0child\0text\0";
        assert_eq!(read_i32(&bytes, 12), 44);
        assert_eq!(read_i32(&bytes, 16), 2);
        assert_eq!(read_i32(&bytes, 20), 44 + 2 * 28);
        assert_eq!(read_i32(&bytes, 24), 1);
        assert_eq!(read_i32(&bytes, 28), 44 + 2 * 28 + 8);
        assert_eq!(read_i32(&bytes, 32), 1);
        assert_eq!(read_i32(&bytes, 36), 44 + 2 * 28 + 8 + 4);
        assert_eq!(read_i32(&bytes, 40) as usize, strings.len());
        assert_eq!(bytes.len(), 44 + 2 * 28 + 8 + 4 + strings.len());
        assert_eq!(&bytes[bytes.len() - strings.len()..], strings);

        let parsed = CryXml::parse(&bytes).unwrap();
        let nodes = parsed.nodes();

        assert_eq!(nodes[0].parent_index.get(), -1);
        assert_eq!(nodes[0].attribute_count.get(), 1);
        assert_eq!(nodes[0].child_count.get(), 1);
        assert_eq!(nodes[1].parent_index.get(), 0);
        assert_eq!(nodes[1].attribute_count.get(), 0);
        assert_eq!(nodes[1].child_count.get(), 0);
        assert_eq!(nodes[1].reserved.get(), 0);
        assert_eq!(parsed.get_string(nodes[1].content_offset.get()).unwrap(), "text");

        let attr = parsed.attributes()[0];
        assert_eq!(parsed.get_string(attr.name_offset.get()).unwrap(), "attr");
        assert_eq!(parsed.get_string(attr.value_offset.get()).unwrap(), "v");

        assert_eq!(parsed.child_indices(), &[1]);
    }

    #[test]
    fn test_child_indices_follow_parent() {
        let root = Element::new("a")
            .child(Element::new("b").child(Element::new("c")).child(Element::new("d")))
            .child(Element::new("e").child(Element::new("f")))
            .child(Element::new("g"));
        let bytes = CryXmlBuilder::new(root).build().unwrap();
        let parsed = CryXml::parse(&bytes).unwrap();

        assert_eq!(parsed.child_indices(), &[1, 4, 6, 2, 3, 5]);
        for (index, node) in parsed.nodes().iter().enumerate() {
            for &child in parsed.child_slots(node).unwrap() {
                assert!(child as usize > index);
                assert!((child as usize) < parsed.nodes().len());
                assert_eq!(parsed.node(child as usize).unwrap().parent_index.get(), index as i32);
            }
        }
        assert!(parsed.verify_child_table().is_ok());
    }

    #[test]
    fn test_round_trip() {
        let original = Element::new("Config")
            .attr("version", "2.0")
            .attr("name", "test")
            .child(Element::new("Setting").attr("key", "option1").attr("value", "enabled"))
            .child(Element::new("Setting").attr("key", "option2").text("disabled"))
            .child(Element::new("Empty"));

        let bytes = CryXmlBuilder::new(original.clone()).build().unwrap();
        let decoded = CryXml::parse(&bytes).unwrap().to_element().unwrap();

        assert_eq!(decoded, original);
    }

    struct Lcg(u32);

    impl Lcg {
        fn next(&mut self, bound: u32) -> u32 {
            self.0 = self.0.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (self.0 >> 16) % bound
        }
    }

    fn generate(rng: &mut Lcg, depth: u32) -> Element {
        let mut element = Element::new(format!("n{}", rng.next(6)));
        if rng.next(3) == 0 {
            element.text = format!("text {}", rng.next(100));
        }
        for i in 0..rng.next(4) {
            element.attributes.push((format!("a{i}"), format!("{}", rng.next(1000))));
        }
        if depth > 0 {
            for _ in 0..rng.next(4) {
                element.children.push(generate(rng, depth - 1));
            }
        }
        element
    }

    #[test]
    fn test_round_trip_generated_trees() {
        let mut rng = Lcg(0x2545_f491);
        for _ in 0..50 {
            let tree = generate(&mut rng, 4);
            for dedup in [false, true] {
                let bytes = CryXmlBuilder::new(tree.clone()).dedup_strings(dedup).build().unwrap();
                let parsed = CryXml::parse(&bytes).unwrap();

                assert_eq!(parsed.nodes().len(), tree.node_count());
                assert!(parsed.verify_child_table().is_ok());
                assert_eq!(parsed.to_element().unwrap(), tree);
            }
        }
    }

    #[test]
    fn test_dedup_strings() {
        let root = Element::new("Setting")
            .child(Element::new("Setting").attr("key", "Setting"))
            .child(Element::new("Setting").attr("key", "Setting"));

        let plain = CryXmlBuilder::new(root.clone()).build().unwrap();
        let interned = CryXmlBuilder::new(root.clone()).dedup_strings(true).build().unwrap();

        assert!(interned.len() < plain.len());
        // "Setting\0", "\0", "key\0"
        assert_eq!(read_i32(&interned, 40), 8 + 1 + 4);

        let decoded = CryXml::parse(&interned).unwrap().to_element().unwrap();
        assert_eq!(decoded, root);
    }

    #[test]
    fn test_empty_name_rejected() {
        let root = Element::new("root").child(Element::new("ok")).child(Element::new(""));
        let result = CryXmlBuilder::new(root).build();

        assert!(matches!(result, Err(Error::EmptyElementName { index: 2 })));
    }

    #[test]
    fn test_embedded_nul_rejected() {
        let result = CryXmlBuilder::new(Element::new("a").text("x\0y")).build();
        assert!(matches!(result, Err(Error::EmbeddedNul { index: 0, what: "text" })));

        let root = Element::new("a").child(Element::new("b").attr("k", "v\0"));
        let result = CryXmlBuilder::new(root).build();
        assert!(matches!(result, Err(Error::EmbeddedNul { index: 1, what: "attribute value" })));

        let result = CryXmlBuilder::new(Element::new("a\0b")).build();
        assert!(matches!(result, Err(Error::EmbeddedNul { index: 0, what: "name" })));
    }

    #[test]
    fn test_deep_chain_round_trip() {
        const DEPTH: usize = 100_000;
        let mut tree = Element::new("leaf").text("bottom");
        for _ in 0..DEPTH {
            tree = Element::new("a").child(tree);
        }

        let bytes = CryXmlBuilder::new(tree).build().unwrap();
        let parsed = CryXml::parse(&bytes).unwrap();
        assert_eq!(parsed.nodes().len(), DEPTH + 1);
        assert!(parsed.verify_child_table().is_ok());

        let decoded = parsed.to_element().unwrap();
        let last = decoded.iter().last().unwrap();
        assert_eq!(decoded.iter().count(), DEPTH + 1);
        assert_eq!((last.name.as_str(), last.text.as_str()), ("leaf", "bottom"));
    }

    #[test]
    fn test_too_many_children_rejected() {
        let root = Element::new("root").children((0..=MAX_ENTRIES).map(|_| Element::new("c")));
        let result = CryXmlBuilder::new(root).build();

        assert!(matches!(
            result,
            Err(Error::TooManyEntries { what: "children", .. })
        ));
    }
}
