//! Conversation (DLG) handling for `KotOR` I and II
//!
//! A DLG file is a GFF tree holding two flat arrays, `EntryList` (NPC lines)
//! and `ReplyList` (player choices), cross-referenced by index. This module
//! turns them into a graph and back.
//!
//! # Overview
//!
//! - [`Dlg`] owns every node in an arena; [`NodeId`] addresses them
//! - [`DlgLink`]s point from an entry to a reply or from a reply to an entry
//! - `starters` link to the entries a conversation can open with
//! - The graph may share nodes between links and may contain cycles
//!
//! # Usage
//!
//! ```no_run
//! use odysseykit::dialog::{read_dlg, write_dlg, DismantleOptions};
//! use odysseykit::formats::ResourceFormat;
//!
//! let mut dlg = read_dlg("path/to/conversation.dlg").unwrap();
//! print!("{}", dlg.print_tree());
//!
//! write_dlg(&mut dlg, "out.dlg", &DismantleOptions::default(), ResourceFormat::Gff).unwrap();
//! ```

mod construct;
mod dismantle;
mod graph;
mod snapshot;
mod types;

pub use construct::construct_dlg;
pub use dismantle::{DismantleOptions, dismantle_dlg, dismantle_dlg_with};
pub use graph::{DlgPathTarget, DlgTarget};
pub use types::{
    ComputerType, ConversationType, Dlg, DlgAnimation, DlgEntry, DlgLink, DlgNode, DlgReply, DlgStunt, NodeData,
    NodeId,
};

use crate::error::Result;
use crate::formats::common::ResourceFormat;
use crate::formats::gff::{bytes_gff, parse_gff, read_gff};
use std::path::Path;

/// Read a DLG file in binary or XML GFF form
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid GFF data.
pub fn read_dlg<P: AsRef<Path>>(path: P) -> Result<Dlg> {
    Ok(construct_dlg(&read_gff(path)?))
}

/// Parse DLG data in binary or XML GFF form
///
/// # Errors
/// Returns an error if the data is not valid GFF.
pub fn parse_dlg(data: &[u8]) -> Result<Dlg> {
    Ok(construct_dlg(&parse_gff(data)?))
}

/// Write a DLG file
///
/// Reassigns the `list_index` of every written node and link.
///
/// # Errors
/// Returns an error if the file cannot be written or `format` is not a GFF
/// encoding.
pub fn write_dlg<P: AsRef<Path>>(
    dlg: &mut Dlg,
    path: P,
    options: &DismantleOptions,
    format: ResourceFormat,
) -> Result<()> {
    let data = bytes_dlg(dlg, options, format)?;
    std::fs::write(path, data)?;
    Ok(())
}

/// Encode a DLG
///
/// # Errors
/// Returns an error if `format` is not a GFF encoding.
pub fn bytes_dlg(dlg: &mut Dlg, options: &DismantleOptions, format: ResourceFormat) -> Result<Vec<u8>> {
    let gff = dismantle_dlg_with(dlg, options);
    bytes_gff(&gff, format)
}
