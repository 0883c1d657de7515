//! Format detection and conversion direction.

use std::fmt;

use crate::{Error, Result};

/// The two representations a file can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Textual XML.
    Xml,
    /// Packed CryXmlB binary.
    CryXmlB,
}

impl Format {
    /// Detect the format from the first byte: `<` is XML, `C` is CryXmlB.
    ///
    /// Only the first byte is inspected; a CryXmlB buffer with a broken
    /// signature is reported later by the decoder.
    pub fn detect(data: &[u8]) -> Result<Self> {
        match data.first() {
            Some(b'<') => Ok(Format::Xml),
            Some(b'C') => Ok(Format::CryXmlB),
            first => Err(Error::UnknownFormat {
                first_byte: first.copied(),
            }),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Xml => f.write_str("XML"),
            Format::CryXmlB => f.write_str("CryXmlB"),
        }
    }
}

/// Which way a conversion goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// CryXmlB to XML.
    ToXml,
    /// XML to CryXmlB.
    ToCryXmlB,
}

impl Direction {
    /// The direction that converts data currently in `source` format.
    pub fn for_source(source: Format) -> Self {
        match source {
            Format::Xml => Direction::ToCryXmlB,
            Format::CryXmlB => Direction::ToXml,
        }
    }

    /// The format this direction produces.
    pub fn target(self) -> Format {
        match self {
            Direction::ToXml => Format::Xml,
            Direction::ToCryXmlB => Format::CryXmlB,
        }
    }

    /// The format this direction consumes.
    pub fn source(self) -> Format {
        match self {
            Direction::ToXml => Format::CryXmlB,
            Direction::ToCryXmlB => Format::Xml,
        }
    }

    /// Suffix appended to a file name to keep the original before it is
    /// overwritten.
    pub fn backup_suffix(self) -> &'static str {
        match self {
            Direction::ToXml => "bak",
            Direction::ToCryXmlB => "xml.bak",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(Format::detect(b"<?xml version=\"1.0\"?>").unwrap(), Format::Xml);
        assert_eq!(Format::detect(b"<root/>").unwrap(), Format::Xml);
        assert_eq!(Format::detect(b"CryXmlB\0").unwrap(), Format::CryXmlB);
        assert!(matches!(
            Format::detect(b"{\"json\": true}"),
            Err(Error::UnknownFormat { first_byte: Some(b'{') })
        ));
        assert!(matches!(
            Format::detect(b""),
            Err(Error::UnknownFormat { first_byte: None })
        ));
    }

    #[test]
    fn test_direction() {
        assert_eq!(Direction::for_source(Format::Xml), Direction::ToCryXmlB);
        assert_eq!(Direction::for_source(Format::CryXmlB), Direction::ToXml);
        assert_eq!(Direction::ToXml.target(), Format::Xml);
        assert_eq!(Direction::ToCryXmlB.source(), Format::Xml);
        assert_eq!(Direction::ToXml.backup_suffix(), "bak");
        assert_eq!(Direction::ToCryXmlB.backup_suffix(), "xml.bak");
    }
}
