//! GFF (Generic File Format) binary and XML codecs
//!
//! GFF is the hierarchical container behind most `KotOR` resources: dialogs,
//! creature and item blueprints, area descriptions and so on. A document is a
//! tree of labelled, typed fields rooted in a single struct.

mod document;
mod reader;
mod types;
mod writer;
pub mod xml;

use crate::error::{Error, Result};
use crate::formats::common::ResourceFormat;
use std::path::Path;

// Public API
pub use document::{FromGffValue, Gff, GffList, GffStruct, GffValue};
pub use reader::{parse_gff_bytes, read_gff_binary};
pub use types::{GffContent, GffFieldType};
pub use writer::{serialize_gff, write_gff_binary};
pub use xml::{gff_to_xml, parse_gff_xml, read_gff_xml, write_gff_xml};

/// Sniff the encoding of GFF data starting at `offset`.
///
/// A known content tag means binary; a `<` anywhere in the four bytes means
/// XML; anything else, including data shorter than four bytes, is
/// [`ResourceFormat::Invalid`].
#[must_use]
pub fn detect_gff(data: &[u8], offset: usize) -> ResourceFormat {
    let Some(head) = data.get(offset..offset.saturating_add(4)) else {
        return ResourceFormat::Invalid;
    };
    if GffContent::is_known_tag(head) {
        ResourceFormat::Gff
    } else if head.contains(&b'<') {
        ResourceFormat::GffXml
    } else {
        ResourceFormat::Invalid
    }
}

/// Read a GFF file in whichever encoding it uses
///
/// # Errors
/// Returns [`Error::UnsupportedFormat`] when the encoding cannot be detected,
/// or any error from the matching codec.
pub fn read_gff<P: AsRef<Path>>(path: P) -> Result<Gff> {
    let data = std::fs::read(path)?;
    parse_gff(&data)
}

/// Parse GFF data in whichever encoding it uses
///
/// # Errors
/// Returns [`Error::UnsupportedFormat`] when the encoding cannot be detected,
/// or any error from the matching codec.
pub fn parse_gff(data: &[u8]) -> Result<Gff> {
    match detect_gff(data, 0) {
        ResourceFormat::Gff => parse_gff_bytes(data),
        ResourceFormat::GffXml => parse_gff_xml(std::str::from_utf8(data)?),
        other => Err(Error::UnsupportedFormat(format!("cannot read GFF from {other} data"))),
    }
}

/// Write a GFF file in the requested encoding
///
/// # Errors
/// Returns [`Error::UnsupportedFormat`] for a non-GFF target format, or any
/// error from the matching codec.
pub fn write_gff<P: AsRef<Path>>(gff: &Gff, path: P, format: ResourceFormat) -> Result<()> {
    let data = bytes_gff(gff, format)?;
    std::fs::write(path, data)?;
    Ok(())
}

/// Encode a GFF in the requested encoding
///
/// # Errors
/// Returns [`Error::UnsupportedFormat`] for a non-GFF target format, or any
/// error from the matching codec.
pub fn bytes_gff(gff: &Gff, format: ResourceFormat) -> Result<Vec<u8>> {
    match format {
        ResourceFormat::Gff => serialize_gff(gff),
        ResourceFormat::GffXml => Ok(gff_to_xml(gff)?.into_bytes()),
        other => Err(Error::UnsupportedFormat(format!("cannot write GFF as {other}"))),
    }
}
