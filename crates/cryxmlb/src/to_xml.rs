//! Serialize an element tree as XML text.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::{Element, Error, Result};

impl Element {
    /// Convert to an indented XML document string.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut output = Vec::new();
        self.write_xml(&mut output)?;
        String::from_utf8(output).map_err(|e| Error::Xml(e.to_string()))
    }

    /// Write an XML document to a writer.
    pub fn write_xml<W: Write>(&self, writer: W) -> Result<()> {
        let mut xml_writer = Writer::new_with_indent(writer, b' ', 2);

        xml_writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(|e| Error::Xml(e.to_string()))?;

        write_element(&mut xml_writer, self)?;

        xml_writer
            .get_mut()
            .write_all(b"\n")
            .map_err(Error::Io)
    }
}

enum Step<'a> {
    Open(&'a Element),
    Close(&'a Element),
}

/// Write an element and its subtree without recursing.
fn write_element<W: Write>(writer: &mut Writer<W>, root: &Element) -> Result<()> {
    let mut pending = vec![Step::Open(root)];

    while let Some(step) = pending.pop() {
        let event = match step {
            Step::Open(element) => {
                let mut start = BytesStart::new(element.name.as_str());
                for (name, value) in &element.attributes {
                    start.push_attribute((name.as_str(), value.as_str()));
                }

                if element.text.is_empty() && element.children.is_empty() {
                    Event::Empty(start)
                } else {
                    writer
                        .write_event(Event::Start(start))
                        .map_err(|e| Error::Xml(e.to_string()))?;
                    if !element.text.is_empty() {
                        writer
                            .write_event(Event::Text(BytesText::new(&element.text)))
                            .map_err(|e| Error::Xml(e.to_string()))?;
                    }
                    pending.push(Step::Close(element));
                    pending.extend(element.children.iter().rev().map(Step::Open));
                    continue;
                }
            }
            Step::Close(element) => Event::End(BytesEnd::new(element.name.as_str())),
        };
        writer.write_event(event).map_err(|e| Error::Xml(e.to_string()))?;
    }
    Ok(())
}
