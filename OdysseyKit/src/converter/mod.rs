//! Format conversion utilities
//!
//! File-to-file conversions between the encodings each resource supports:
//! - GFF (binary) ↔ GFF XML
//! - SSF (binary) ↔ SSF XML
//! - DLG (GFF, either encoding) ↔ JSON snapshot
//!
//! [`convert_resource`] sniffs the source and picks the conversion itself.

mod dlg_json;
mod gff_xml;
mod ssf_xml;

use crate::error::{Error, Result};
use crate::formats::common::ResourceFormat;
use crate::formats::{gff, ssf};
use std::path::Path;

/// Progress callback type for conversion operations.
/// The callback receives a message describing the current step.
pub type ProgressCallback<'a> = &'a dyn Fn(&str);

pub use dlg_json::{convert_dlg_to_json, convert_json_to_dlg};
pub use gff_xml::{convert_gff_to_xml, convert_xml_to_gff};
pub use ssf_xml::{convert_ssf_to_xml, convert_xml_to_ssf};

/// Identify which resource encoding `data` holds.
///
/// Binary data is recognised by its magic. XML is told apart by content: a
/// document with `<sound>` elements and no `<struct>` is a sound set,
/// anything else is taken as GFF XML.
#[must_use]
pub fn detect_resource(data: &[u8]) -> ResourceFormat {
    match (ssf::detect_ssf(data, 0), gff::detect_gff(data, 0)) {
        (ResourceFormat::Ssf, _) => ResourceFormat::Ssf,
        (_, ResourceFormat::Gff) => ResourceFormat::Gff,
        (_, ResourceFormat::GffXml) | (ResourceFormat::SsfXml, _) => {
            let text = String::from_utf8_lossy(data);
            if text.contains("<sound") && !text.contains("<struct") {
                ResourceFormat::SsfXml
            } else {
                ResourceFormat::GffXml
            }
        }
        _ => ResourceFormat::Invalid,
    }
}

/// The encoding a resource is converted to when no target is given.
#[must_use]
pub fn default_target(source: ResourceFormat) -> ResourceFormat {
    match source {
        ResourceFormat::Gff => ResourceFormat::GffXml,
        ResourceFormat::GffXml => ResourceFormat::Gff,
        ResourceFormat::Ssf => ResourceFormat::SsfXml,
        ResourceFormat::SsfXml => ResourceFormat::Ssf,
        ResourceFormat::Invalid => ResourceFormat::Invalid,
    }
}

/// Convert a GFF or SSF file to another encoding of the same resource
///
/// The source encoding is detected from its content. With no `target`, binary
/// becomes XML and XML becomes binary. Returns the source encoding.
///
/// # Errors
/// Returns [`Error::UnsupportedFormat`] if the source cannot be identified or
/// `target` belongs to a different resource type, or any read/write error.
pub fn convert_resource<P: AsRef<Path>>(source: P, dest: P, target: Option<ResourceFormat>) -> Result<ResourceFormat> {
    convert_resource_with_progress(source, dest, target, &|_| {})
}

/// Convert a GFF or SSF file with progress callback
///
/// # Errors
/// Same as [`convert_resource`].
pub fn convert_resource_with_progress<P: AsRef<Path>>(
    source: P,
    dest: P,
    target: Option<ResourceFormat>,
    progress: ProgressCallback,
) -> Result<ResourceFormat> {
    progress("Reading source file...");
    let data = std::fs::read(source.as_ref())?;
    let detected = detect_resource(&data);
    let target = target.unwrap_or_else(|| default_target(detected));
    tracing::info!(
        "Converting {}→{}: {:?} → {:?}",
        detected,
        target,
        source.as_ref(),
        dest.as_ref()
    );

    progress("Converting...");
    let output = match detected {
        ResourceFormat::Gff | ResourceFormat::GffXml => gff::bytes_gff(&gff::parse_gff(&data)?, target)?,
        ResourceFormat::Ssf | ResourceFormat::SsfXml => ssf::bytes_ssf(&ssf::parse_ssf(&data)?, target)?,
        ResourceFormat::Invalid => {
            return Err(Error::UnsupportedFormat(format!(
                "cannot identify the format of {}",
                source.as_ref().display()
            )));
        }
    };

    progress("Writing output file...");
    std::fs::write(dest, output)?;
    tracing::info!("Conversion complete");
    Ok(detected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::gff::{Gff, GffContent, gff_to_xml, serialize_gff};
    use crate::formats::ssf::{Ssf, SsfSound, serialize_ssf, ssf_to_xml};
    use std::cell::RefCell;

    fn sample_gff() -> Gff {
        let mut gff = Gff::new(GffContent::Utc);
        gff.root.set_string("Tag", "carth");
        gff
    }

    #[test]
    fn test_detect_resource() {
        let gff = sample_gff();
        let ssf = Ssf::new();
        assert_eq!(detect_resource(&serialize_gff(&gff).unwrap()), ResourceFormat::Gff);
        assert_eq!(detect_resource(gff_to_xml(&gff).unwrap().as_bytes()), ResourceFormat::GffXml);
        assert_eq!(detect_resource(&serialize_ssf(&ssf).unwrap()), ResourceFormat::Ssf);
        assert_eq!(detect_resource(ssf_to_xml(&ssf).unwrap().as_bytes()), ResourceFormat::SsfXml);
        assert_eq!(detect_resource(b"RIFF...."), ResourceFormat::Invalid);
        assert_eq!(detect_resource(b""), ResourceFormat::Invalid);
    }

    #[test]
    fn test_convert_resource_flips_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("p_carth.utc");
        let xml = dir.path().join("p_carth.utc.xml");
        let back = dir.path().join("p_carth2.utc");
        gff::write_gff(&sample_gff(), &source, ResourceFormat::Gff).unwrap();

        let steps = RefCell::new(Vec::new());
        let detected =
            convert_resource_with_progress(&source, &xml, None, &|step| steps.borrow_mut().push(step.to_string()))
                .unwrap();
        assert_eq!(detected, ResourceFormat::Gff);
        assert_eq!(steps.borrow().len(), 3);
        assert_eq!(convert_resource(&xml, &back, None).unwrap(), ResourceFormat::GffXml);
        assert_eq!(std::fs::read(&source).unwrap(), std::fs::read(&back).unwrap());
    }

    #[test]
    fn test_convert_resource_rejects_mismatched_target() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("c_bastila.ssf");
        let dest = dir.path().join("out");
        let mut ssf = Ssf::new();
        ssf.set(SsfSound::DEAD, 4);
        ssf::write_ssf(&ssf, &source, ResourceFormat::Ssf).unwrap();

        let result = convert_resource(&source, &dest, Some(ResourceFormat::GffXml));
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
        assert!(!dest.exists());
    }

    #[test]
    fn test_convert_resource_unknown_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("noise.bin");
        std::fs::write(&source, b"\x00\x01\x02\x03").unwrap();
        let result = convert_resource(&source, &dir.path().join("out"), None);
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }
}
