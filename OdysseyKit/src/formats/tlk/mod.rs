//! TLK (talk table) reader
//!
//! Read-only random access into a talk table. Every accessor re-opens the
//! backing file (or rewinds the in-memory buffer) and releases it before
//! returning, so lookups always reflect what is currently on disk.
//! [`TalkTable::batch`] resolves many string references with a single open.

mod reader;

pub use reader::{TalkTable, TlkEntry};
