//! CLI commands for DLG conversation files

use std::path::Path;

use crate::converter::{convert_dlg_to_json, convert_json_to_dlg};
use crate::dialog::{DismantleOptions, read_dlg};
use crate::formats::common::{Game, ResourceFormat};

/// Print the conversation tree
pub fn tree(source: &Path) -> anyhow::Result<()> {
    let dlg = read_dlg(source)?;
    println!(
        "{} entries, {} replies, {} starters",
        dlg.all_entries().len(),
        dlg.all_replies().len(),
        dlg.starters.len()
    );
    print!("{}", dlg.print_tree());
    Ok(())
}

/// DLG -> JSON snapshot
pub fn to_json(source: &Path, destination: &Path) -> anyhow::Result<()> {
    convert_dlg_to_json(source, destination)?;
    println!("Wrote {}", destination.display());
    Ok(())
}

/// JSON snapshot -> DLG
pub fn from_json(source: &Path, destination: &Path, game: Game, use_deprecated: bool, xml: bool) -> anyhow::Result<()> {
    let options = DismantleOptions { game, use_deprecated };
    let format = if xml { ResourceFormat::GffXml } else { ResourceFormat::Gff };
    convert_json_to_dlg(source, destination, &options, format)?;
    println!("Wrote {}", destination.display());
    Ok(())
}
