//! SSF binary ↔ XML conversion

use crate::error::Result;
use crate::formats::common::ResourceFormat;
use crate::formats::ssf::{parse_ssf_bytes, parse_ssf_xml, write_ssf};
use std::path::Path;

/// Convert a binary SSF file to XML
///
/// # Errors
/// Returns an error if reading or conversion fails.
pub fn convert_ssf_to_xml<P: AsRef<Path>>(source: P, dest: P) -> Result<()> {
    tracing::info!("Converting SSF→XML: {:?} → {:?}", source.as_ref(), dest.as_ref());
    let ssf = parse_ssf_bytes(&std::fs::read(&source)?)?;
    write_ssf(&ssf, dest, ResourceFormat::SsfXml)?;
    tracing::info!("Conversion complete");
    Ok(())
}

/// Convert an SSF XML file to binary
///
/// # Errors
/// Returns an error if reading or conversion fails.
pub fn convert_xml_to_ssf<P: AsRef<Path>>(source: P, dest: P) -> Result<()> {
    tracing::info!("Converting XML→SSF: {:?} → {:?}", source.as_ref(), dest.as_ref());
    let ssf = parse_ssf_xml(&std::fs::read_to_string(&source)?)?;
    write_ssf(&ssf, dest, ResourceFormat::Ssf)?;
    tracing::info!("Conversion complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::ssf::{SSF_FILE_SIZE, Ssf, SsfSound, read_ssf};

    #[test]
    fn test_ssf_xml_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("c_hk47.ssf");
        let xml = dir.path().join("c_hk47.xml");
        let back = dir.path().join("c_hk47_2.ssf");

        let mut ssf = Ssf::new();
        ssf.set(SsfSound::BATTLE_CRY_1, 48_000);
        ssf.set(SsfSound::POISONED, 48_027);
        write_ssf(&ssf, &binary, ResourceFormat::Ssf).unwrap();

        convert_ssf_to_xml(&binary, &xml).unwrap();
        assert!(std::fs::read_to_string(&xml).unwrap().contains("label=\"POISONED\""));
        convert_xml_to_ssf(&xml, &back).unwrap();
        assert_eq!(std::fs::read(&back).unwrap().len(), SSF_FILE_SIZE);
        assert_eq!(read_ssf(&back).unwrap(), ssf);
    }
}
