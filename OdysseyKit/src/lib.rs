//! # OdysseyKit
//!
//! A pure-Rust library for working with the BioWare Odyssey engine file
//! formats used by Knights of the Old Republic I and II.
//!
//! ## Supported Formats
//!
//! - **GFF** - Generic File Format trees, binary (`V3.2`) and XML
//! - **DLG** - Conversations, mapped from GFF to a node graph and back
//! - **SSF** - Sound sets, binary and XML
//! - **TLK** - Talk tables (read-only random access)
//!
//! ## Quick Start
//!
//! ### Reading and Writing GFF
//!
//! ```no_run
//! use odysseykit::formats::gff::{read_gff, write_gff};
//! use odysseykit::formats::ResourceFormat;
//!
//! // Binary or XML, detected from the content
//! let mut gff = read_gff("p_bastila.utc")?;
//! gff.root.set_string("Tag", "bastila");
//! write_gff(&gff, "p_bastila.utc.xml", ResourceFormat::GffXml)?;
//! # Ok::<(), odysseykit::Error>(())
//! ```
//!
//! ### Walking a Conversation
//!
//! ```no_run
//! use odysseykit::dialog::read_dlg;
//!
//! let dlg = read_dlg("end_trask.dlg")?;
//! for id in dlg.all_entries() {
//!     println!("{}: {}", dlg[id].speaker().unwrap_or(""), dlg[id].data().text);
//! }
//! # Ok::<(), odysseykit::Error>(())
//! ```
//!
//! ### Using the Prelude
//!
//! ```
//! use odysseykit::prelude::*;
//!
//! let mut dlg = Dlg::new();
//! let entry = dlg.add_entry(DlgEntry::default());
//! dlg.add_starter(entry);
//! assert_eq!(dlg.all_entries(), vec![entry]);
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `odysseykit` command-line binary

pub mod converter;
pub mod dialog;
pub mod error;
pub mod formats;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::formats::common::{Color, Game, Gender, Language, LocalizedString, ResRef, ResourceFormat};
    pub use crate::formats::gff::{
        Gff, GffContent, GffFieldType, GffList, GffStruct, GffValue, read_gff, write_gff,
    };
    pub use crate::formats::ssf::{Ssf, SsfSound, read_ssf, write_ssf};
    pub use crate::formats::tlk::{TalkTable, TlkEntry};

    pub use crate::dialog::{
        DismantleOptions, Dlg, DlgEntry, DlgLink, DlgNode, DlgReply, NodeId, construct_dlg, dismantle_dlg,
        read_dlg, write_dlg,
    };

    pub use crate::converter;
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
