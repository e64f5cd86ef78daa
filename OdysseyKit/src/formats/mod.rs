//! File format handlers for Odyssey engine resources

pub mod common;
pub mod gff;
pub mod ssf;
pub mod tlk;

// Re-export common types for convenience
pub use common::{Color, Game, Gender, Language, LocalizedString, ResRef, ResourceFormat};

// Re-export main document types
pub use gff::{Gff, GffContent, GffFieldType, GffList, GffStruct, GffValue};
pub use ssf::{Ssf, SsfSound};
pub use tlk::{TalkTable, TlkEntry};
