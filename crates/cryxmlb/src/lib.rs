//! Lossless codec between CryXmlB packed binary XML and textual XML.
//!
//! CryXmlB stores an XML document as four flat tables behind a fixed header:
//! nodes in pre-order, attribute references, child index runs, and a blob of
//! null-terminated strings addressed by byte offset.
//!
//! - [`CryXml`] decodes the tables and rebuilds an [`Element`] tree.
//! - [`CryXmlBuilder`] flattens an [`Element`] tree back into the tables.
//! - [`Format::detect`] and [`Converter`] pick and run a conversion for a
//!   whole buffer.
//!
//! # Example
//!
//! ```no_run
//! use cryxmlb::CryXml;
//!
//! let data = std::fs::read("material.mtl")?;
//!
//! if CryXml::is_cryxml(&data) {
//!     let cryxml = CryXml::parse(&data)?;
//!     let xml_string = cryxml.to_xml_string()?;
//!     println!("{}", xml_string);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod attribute;
mod builder;
mod element;
mod error;
mod format;
mod header;
mod node;
mod parser;
mod string_table;

#[cfg(feature = "xml")]
mod convert;
#[cfg(feature = "xml")]
mod from_xml;
#[cfg(feature = "xml")]
mod to_xml;

pub use attribute::CryXmlAttribute;
pub use builder::{CryXmlBuilder, MAX_ENTRIES};
pub use element::{Element, PreOrder};
pub use error::{Error, Result};
pub use format::{Direction, Format};
pub use header::CryXmlHeader;
pub use node::CryXmlNode;
pub use parser::CryXml;
pub use string_table::{StringData, StringTable};

#[cfg(feature = "xml")]
pub use convert::{decode_to_xml, encode_from_xml, Converted, Converter, DecodeOptions, EncodeOptions};
