//! Parse XML text into an element tree.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::builder::CryXmlBuilder;
use crate::{Element, Error, Result};

impl Element {
    /// Parse an XML document into its root element.
    ///
    /// Text and CDATA fragments are joined, then trimmed once per element;
    /// whitespace-only text becomes empty. Declarations, comments,
    /// processing instructions and doctypes are ignored.
    pub fn from_xml(xml: &str) -> Result<Self> {
        parse_xml_to_element(xml)
    }

    /// Parse UTF-8 XML bytes into their root element.
    pub fn from_xml_bytes(xml: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(xml).map_err(Error::Utf8)?;
        Self::from_xml(xml)
    }
}

impl CryXmlBuilder {
    /// Parse XML text and create a builder that can produce CryXmlB bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use cryxmlb::CryXmlBuilder;
    ///
    /// let xml = r#"<?xml version="1.0"?>
    /// <Material Name="TestMaterial">
    ///     <Textures>
    ///         <Texture Map="Diffuse" File="test.dds"/>
    ///     </Textures>
    /// </Material>"#;
    ///
    /// let builder = CryXmlBuilder::from_xml(xml).unwrap();
    /// let bytes = builder.build().unwrap();
    /// assert!(bytes.starts_with(b"CryXmlB\0"));
    /// ```
    pub fn from_xml(xml: &str) -> Result<Self> {
        Element::from_xml(xml).map(Self::new)
    }

    /// Parse XML bytes and create a builder.
    pub fn from_xml_bytes(xml: &[u8]) -> Result<Self> {
        Element::from_xml_bytes(xml).map(Self::new)
    }
}

fn parse_xml_to_element(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::XmlParse(format!("at byte {}: {}", reader.error_position(), e))
        })?;

        match event {
            Event::Start(e) => {
                if stack.is_empty() && root.is_some() {
                    return Err(Error::XmlParse("multiple root elements".to_string()));
                }
                stack.push(start_element(&e)?);
            }
            Event::Empty(e) => {
                let element = start_element(&e)?;
                close_element(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    close_element(&mut stack, &mut root, element)?;
                }
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(|e| Error::XmlParse(e.to_string()))?;
                append_text(&mut stack, &text)?;
            }
            Event::CData(e) => {
                let text = std::str::from_utf8(&e).map_err(Error::Utf8)?;
                append_text(&mut stack, text)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::XmlParse(format!("unclosed element <{}>", open.name)));
    }

    root.ok_or_else(|| Error::XmlParse("no root element found".to_string()))
}

fn start_element(start: &BytesStart<'_>) -> Result<Element> {
    let qname = start.name();
    let name = std::str::from_utf8(qname.as_ref()).map_err(Error::Utf8)?;
    let mut element = Element::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::XmlParse(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(Error::Utf8)?;
        let value = attr.unescape_value().map_err(|e| Error::XmlParse(e.to_string()))?;
        element.attributes.push((key.to_owned(), value.into_owned()));
    }

    Ok(element)
}

/// Trim the collected text of a finished element and attach it to its
/// parent, or make it the root.
fn close_element(stack: &mut [Element], root: &mut Option<Element>, mut element: Element) -> Result<()> {
    let trimmed = element.text.trim();
    if trimmed.len() != element.text.len() {
        element.text = trimmed.to_owned();
    }

    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(Error::XmlParse("multiple root elements".to_string()));
        }
        None => *root = Some(element),
    }
    Ok(())
}

/// Collect a text or CDATA fragment untrimmed; the element trims its text
/// once on close.
fn append_text(stack: &mut [Element], text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(element) => {
            element.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(Error::XmlParse(format!("text outside the root element: {:?}", text.trim()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CryXml;

    #[test]
    fn test_from_xml_simple() {
        let xml = r#"<Root version="1.0"/>"#;
        let bytes = CryXmlBuilder::from_xml(xml).unwrap().build().unwrap();

        let parsed = CryXml::parse(&bytes).unwrap();
        let root = parsed.root().unwrap();
        assert_eq!(parsed.get_string(root.name_offset.get()).unwrap(), "Root");

        let attrs = parsed.node_attributes(root).unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(parsed.get_string(attrs[0].name_offset.get()).unwrap(), "version");
        assert_eq!(parsed.get_string(attrs[0].value_offset.get()).unwrap(), "1.0");
    }

    #[test]
    fn test_from_xml_with_declaration() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<!-- exported -->
<Material Name="TestMaterial">
    <Textures>
        <Texture Map="Diffuse" File="test.dds"/>
    </Textures>
</Material>"#;

        let root = Element::from_xml(xml).unwrap();
        assert_eq!(root.name, "Material");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].children[0].attribute("File"), Some("test.dds"));
        assert_eq!(root.text, "");
    }

    #[test]
    fn test_from_xml_nested() {
        let xml = r#"<A>
            <B attr="1">
                <C/>
                <D attr="2"/>
            </B>
            <E/>
        </A>"#;

        let root = Element::from_xml(xml).unwrap();
        let names: Vec<_> = root.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn test_from_xml_text_content() {
        let root = Element::from_xml("<Root><Child>  Hello World </Child></Root>").unwrap();
        assert_eq!(root.children[0].text, "Hello World");
    }

    #[test]
    fn test_from_xml_entities_and_cdata() {
        let xml = r#"<Root expr="a &lt; b">x &amp; y<![CDATA[<raw>]]></Root>"#;
        let root = Element::from_xml(xml).unwrap();

        assert_eq!(root.attribute("expr"), Some("a < b"));
        assert_eq!(root.text, "x & y<raw>");
    }

    #[test]
    fn test_from_xml_text_fragments_keep_inner_whitespace() {
        let root = Element::from_xml("<a>\n  x <![CDATA[y]]> &amp; z\n</a>").unwrap();
        assert_eq!(root.text, "x y & z");

        let root = Element::from_xml("<a>\n  <b/>\n  <c/>\n</a>").unwrap();
        assert_eq!(root.text, "");
    }

    #[test]
    fn test_from_xml_deep_nesting() {
        const DEPTH: usize = 100_000;
        let xml = format!("{}{}", "<a>".repeat(DEPTH), "</a>".repeat(DEPTH));

        let root = Element::from_xml(&xml).unwrap();
        assert_eq!(root.node_count(), DEPTH);

        let bytes = CryXmlBuilder::new(root).build().unwrap();
        assert_eq!(CryXml::parse(&bytes).unwrap().nodes().len(), DEPTH);
    }

    #[test]
    fn test_from_xml_empty() {
        assert!(matches!(Element::from_xml(""), Err(Error::XmlParse(_))));
        assert!(matches!(Element::from_xml("<?xml version=\"1.0\"?>"), Err(Error::XmlParse(_))));
    }

    #[test]
    fn test_from_xml_malformed() {
        assert!(matches!(Element::from_xml("<a><b></a>"), Err(Error::XmlParse(_))));
        assert!(matches!(Element::from_xml("<a><b/>"), Err(Error::XmlParse(_))));
        assert!(matches!(Element::from_xml("<a/><b/>"), Err(Error::XmlParse(_))));
        assert!(matches!(Element::from_xml("<a/>trailing"), Err(Error::XmlParse(_))));
    }

    #[test]
    fn test_xml_round_trip() {
        let original_xml = r#"<Config version="2.0" name="test">
            <Setting key="option1" value="enabled"/>
            <Setting key="option2" value="disabled">note</Setting>
        </Config>"#;

        let original = Element::from_xml(original_xml).unwrap();
        let bytes = CryXmlBuilder::new(original.clone()).build().unwrap();
        let xml_output = CryXml::parse(&bytes).unwrap().to_xml_string().unwrap();

        assert_eq!(Element::from_xml(&xml_output).unwrap(), original);
    }
}
