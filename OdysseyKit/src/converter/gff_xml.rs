//! GFF binary ↔ XML conversion

use crate::error::Result;
use crate::formats::gff::{self, parse_gff_bytes, parse_gff_xml};
use std::path::Path;

/// Convert a binary GFF file to XML
///
/// # Errors
/// Returns an error if reading or conversion fails.
pub fn convert_gff_to_xml<P: AsRef<Path>>(source: P, dest: P) -> Result<()> {
    tracing::info!("Converting GFF→XML: {:?} → {:?}", source.as_ref(), dest.as_ref());
    let data = std::fs::read(&source)?;
    let document = parse_gff_bytes(&data)?;
    tracing::debug!("Read {} GFF with {} root fields", document.content, document.root.len());
    gff::write_gff_xml(&document, dest)?;
    tracing::info!("Conversion complete");
    Ok(())
}

/// Convert a GFF XML file to binary
///
/// # Errors
/// Returns an error if reading or conversion fails.
pub fn convert_xml_to_gff<P: AsRef<Path>>(source: P, dest: P) -> Result<()> {
    tracing::info!("Converting XML→GFF: {:?} → {:?}", source.as_ref(), dest.as_ref());
    let content = std::fs::read_to_string(&source)?;
    let document = parse_gff_xml(&content)?;
    gff::write_gff_binary(&document, dest)?;
    tracing::info!("Conversion complete");
    Ok(())
}
