// Command handlers report failures through anyhow
#![allow(clippy::missing_errors_doc)]

use clap::Subcommand;
use std::path::PathBuf;

use crate::formats::common::{Game, ResourceFormat};

pub mod convert;
pub mod detect;
pub mod dlg;
pub mod tlk;

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a GFF or SSF file between binary and XML
    Convert {
        /// Source file
        #[arg(short, long)]
        source: PathBuf,

        /// Destination file
        #[arg(short, long)]
        destination: PathBuf,

        /// Output format: gff, gff-xml, ssf, ssf-xml (default: the other encoding of the source)
        #[arg(short = 'o', long)]
        output_format: Option<ResourceFormat>,
    },

    /// Print a conversation as an indented tree
    DlgTree {
        /// DLG file (binary or XML)
        #[arg(short, long)]
        source: PathBuf,
    },

    /// Convert a DLG file to a JSON snapshot, or back with --reverse
    DlgJson {
        /// Source file
        #[arg(short, long)]
        source: PathBuf,

        /// Destination file
        #[arg(short, long)]
        destination: PathBuf,

        /// Read JSON and write DLG
        #[arg(short, long)]
        reverse: bool,

        /// Game the DLG is written for (k1, k2). Only used with --reverse
        #[arg(long, default_value = "k2")]
        game: Game,

        /// Omit the deprecated DelayEntry/DelayReply fields. Only used with --reverse
        #[arg(long)]
        no_deprecated: bool,

        /// Write GFF XML instead of binary. Only used with --reverse
        #[arg(long)]
        xml: bool,
    },

    /// Look up strings in a talk table
    Tlk {
        /// TLK file
        #[arg(short, long)]
        source: PathBuf,

        /// String references to resolve (all entries when omitted)
        stringrefs: Vec<i32>,

        /// Also print the sound ResRef of each entry
        #[arg(long)]
        sound: bool,
    },

    /// Identify the format of one or more files
    Detect {
        /// Files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

impl Commands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Convert {
                source,
                destination,
                output_format,
            } => convert::execute(source, destination, *output_format),
            Commands::DlgTree { source } => dlg::tree(source),
            Commands::DlgJson {
                source,
                destination,
                reverse,
                game,
                no_deprecated,
                xml,
            } => {
                if *reverse {
                    dlg::from_json(source, destination, *game, !*no_deprecated, *xml)
                } else {
                    dlg::to_json(source, destination)
                }
            }
            Commands::Tlk {
                source,
                stringrefs,
                sound,
            } => tlk::execute(source, stringrefs, *sound),
            Commands::Detect { files } => detect::execute(files),
        }
    }
}
