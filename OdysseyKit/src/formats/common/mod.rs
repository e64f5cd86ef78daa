//! Common types and utilities shared across all Odyssey formats

pub mod language;
pub mod locstring;
pub mod types;

pub use language::{Gender, Language};
pub use locstring::LocalizedString;
pub use types::{Color, Game, ResRef, ResourceFormat};

// Internal re-exports for the codecs
pub(crate) use language::{decode_text, encode_text};
