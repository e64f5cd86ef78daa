//! DLG ↔ JSON snapshot conversion

use crate::dialog::{self, DismantleOptions, Dlg};
use crate::error::Result;
use crate::formats::common::ResourceFormat;
use std::path::Path;

/// Convert a DLG file (binary or XML GFF) to a JSON snapshot
///
/// # Errors
/// Returns an error if reading or conversion fails.
pub fn convert_dlg_to_json<P: AsRef<Path>>(source: P, dest: P) -> Result<()> {
    tracing::info!("Converting DLG→JSON: {:?} → {:?}", source.as_ref(), dest.as_ref());
    let dlg = dialog::read_dlg(&source)?;
    tracing::debug!(
        "Read dialog with {} entries and {} replies",
        dlg.all_entries().len(),
        dlg.all_replies().len()
    );
    std::fs::write(dest, dlg.to_json_string()?)?;
    tracing::info!("Conversion complete");
    Ok(())
}

/// Convert a JSON snapshot back to a DLG file
///
/// # Errors
/// Returns an error if reading or conversion fails, or `format` is not a GFF
/// encoding.
pub fn convert_json_to_dlg<P: AsRef<Path>>(
    source: P,
    dest: P,
    options: &DismantleOptions,
    format: ResourceFormat,
) -> Result<()> {
    tracing::info!("Converting JSON→DLG: {:?} → {:?}", source.as_ref(), dest.as_ref());
    let mut dlg = Dlg::from_json_str(&std::fs::read_to_string(&source)?)?;
    dialog::write_dlg(&mut dlg, dest, options, format)?;
    tracing::info!("Conversion complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::{DlgEntry, DlgReply};
    use crate::formats::common::Game;

    #[test]
    fn test_dlg_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("end_trask.dlg");
        let json = dir.path().join("end_trask.json");
        let back = dir.path().join("end_trask_2.dlg");

        let mut dlg = Dlg::new();
        let entry = dlg.add_entry(DlgEntry {
            speaker: "end_trask".into(),
            ..DlgEntry::default()
        });
        let reply = dlg.add_reply(DlgReply::default());
        dlg.add_starter(entry);
        dlg.connect(entry, reply);
        dlg.connect(reply, entry).is_child = true;

        let options = DismantleOptions {
            game: Game::K1,
            use_deprecated: true,
        };
        dialog::write_dlg(&mut dlg, &source, &options, ResourceFormat::Gff).unwrap();

        convert_dlg_to_json(&source, &json).unwrap();
        let text = std::fs::read_to_string(&json).unwrap();
        assert!(text.contains("\"DLGEntry\""));
        assert!(text.contains("\"ref\""));

        convert_json_to_dlg(&json, &back, &options, ResourceFormat::Gff).unwrap();
        assert_eq!(std::fs::read(&source).unwrap(), std::fs::read(&back).unwrap());
    }
}
