//! Whole-buffer conversion between CryXmlB and XML.

use tracing::debug;

use crate::{CryXml, CryXmlBuilder, Direction, Element, Error, Format, Result};

/// Options for decoding CryXmlB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Reject files whose child index table disagrees with the parent
    /// indices.
    pub verify_child_table: bool,
}

/// Options for encoding CryXmlB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Store each distinct string once.
    pub dedup_strings: bool,
}

/// Decode a CryXmlB buffer into an XML document string.
pub fn decode_to_xml(data: &[u8], options: &DecodeOptions) -> Result<String> {
    let cryxml = CryXml::parse(data)?;
    if options.verify_child_table {
        cryxml.verify_child_table()?;
    }
    cryxml.to_xml_string()
}

/// Encode an XML document into a CryXmlB buffer.
pub fn encode_from_xml(data: &[u8], options: &EncodeOptions) -> Result<Vec<u8>> {
    let root = Element::from_xml_bytes(data)?;
    CryXmlBuilder::new(root)
        .dedup_strings(options.dedup_strings)
        .build()
}

/// Result of a successful [`Converter::convert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    pub direction: Direction,
    pub bytes: Vec<u8>,
}

/// Converts whole buffers in either direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Converter {
    pub decode: DecodeOptions,
    pub encode: EncodeOptions,
}

impl Converter {
    pub fn new(decode: DecodeOptions, encode: EncodeOptions) -> Self {
        Self { decode, encode }
    }

    /// Convert `data`.
    ///
    /// With no `direction` the direction is picked from the detected format.
    /// If `data` is already in the requested target format the result is
    /// [`Error::AlreadyTargetFormat`] and nothing is converted.
    pub fn convert(&self, data: &[u8], direction: Option<Direction>) -> Result<Converted> {
        let source = Format::detect(data)?;
        let direction = match direction {
            Some(direction) if direction.target() == source => {
                return Err(Error::AlreadyTargetFormat(source));
            }
            Some(direction) => direction,
            None => Direction::for_source(source),
        };
        debug!(?source, ?direction, bytes = data.len(), "converting");

        let bytes = match direction {
            Direction::ToXml => decode_to_xml(data, &self.decode)?.into_bytes(),
            Direction::ToCryXmlB => encode_from_xml(data, &self.encode)?,
        };
        Ok(Converted { direction, bytes })
    }
}
