//! Talk table decoding
//!
//! Header of 20 bytes, then 40-byte entries, then the text block that each
//! entry points into by relative offset and length.

use crate::error::{Error, Result};
use crate::formats::common::{Language, ResRef, decode_text};
use byteorder::{LittleEndian, ReadBytesExt};
use encoding_rs::WINDOWS_1252;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const MAGIC: &[u8; 4] = b"TLK ";
const HEADER_SIZE: u64 = 20;
const ENTRY_SIZE: u64 = 40;

/// One talk table entry with its text resolved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TlkEntry {
    pub flags: u32,
    pub sound: ResRef,
    pub volume_variance: u32,
    pub pitch_variance: u32,
    pub text: String,
    pub sound_length: f32,
}

impl TlkEntry {
    pub const TEXT_PRESENT: u32 = 0x1;
    pub const SOUND_PRESENT: u32 = 0x2;
    pub const SOUND_LENGTH_PRESENT: u32 = 0x4;

    #[must_use]
    pub fn has_text(&self) -> bool {
        self.flags & Self::TEXT_PRESENT != 0
    }

    #[must_use]
    pub fn has_sound(&self) -> bool {
        self.flags & Self::SOUND_PRESENT != 0
    }
}

#[derive(Debug, Clone)]
enum TlkSource {
    File(PathBuf),
    Memory(Arc<[u8]>),
}

trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

struct TlkHeader {
    language: Language,
    entry_count: u32,
    texts_offset: u32,
}

/// Raw 40-byte entry before its text is fetched.
struct RawEntry {
    flags: u32,
    sound: ResRef,
    volume_variance: u32,
    pitch_variance: u32,
    text_offset: u32,
    text_length: u32,
    sound_length: f32,
}

/// A talk table backed by a file path or an in-memory buffer.
///
/// String references of `-1` or past the end of the table resolve to an
/// empty string and a blank sound rather than an error.
#[derive(Debug, Clone)]
pub struct TalkTable {
    source: TlkSource,
}

impl TalkTable {
    /// A talk table read from `path` on every lookup. The file is not opened
    /// here.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        TalkTable {
            source: TlkSource::File(path.as_ref().to_path_buf()),
        }
    }

    /// A talk table over bytes already in memory.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        TalkTable {
            source: TlkSource::Memory(Arc::from(data.into())),
        }
    }

    /// Text of a string reference.
    ///
    /// # Errors
    /// Returns an error if the source cannot be opened or is corrupt.
    pub fn string(&self, stringref: i32) -> Result<String> {
        self.with_reader(|reader, header| {
            Ok(match read_raw_entry(reader, header, stringref)? {
                Some(raw) => read_text(reader, header, &raw)?,
                None => String::new(),
            })
        })
    }

    /// Voice-over sound of a string reference.
    ///
    /// # Errors
    /// Returns an error if the source cannot be opened or is corrupt.
    pub fn sound(&self, stringref: i32) -> Result<ResRef> {
        self.with_reader(|reader, header| {
            Ok(read_raw_entry(reader, header, stringref)?.map_or_else(ResRef::blank, |raw| raw.sound))
        })
    }

    /// The full entry of a string reference; a default entry when it is out
    /// of range.
    ///
    /// # Errors
    /// Returns an error if the source cannot be opened or is corrupt.
    pub fn entry(&self, stringref: i32) -> Result<TlkEntry> {
        self.with_reader(|reader, header| {
            let Some(raw) = read_raw_entry(reader, header, stringref)? else {
                return Ok(TlkEntry::default());
            };
            let text = read_text(reader, header, &raw)?;
            Ok(TlkEntry {
                flags: raw.flags,
                sound: raw.sound,
                volume_variance: raw.volume_variance,
                pitch_variance: raw.pitch_variance,
                text,
                sound_length: raw.sound_length,
            })
        })
    }

    /// Text and sound for many string references with a single open.
    ///
    /// # Errors
    /// Returns an error if the source cannot be opened or is corrupt.
    pub fn batch(&self, stringrefs: &[i32]) -> Result<HashMap<i32, (String, ResRef)>> {
        self.with_reader(|reader, header| {
            let mut resolved = HashMap::with_capacity(stringrefs.len());
            for &stringref in stringrefs {
                if resolved.contains_key(&stringref) {
                    continue;
                }
                let pair = match read_raw_entry(reader, header, stringref)? {
                    Some(raw) => {
                        let text = read_text(reader, header, &raw)?;
                        (text, raw.sound)
                    }
                    None => (String::new(), ResRef::blank()),
                };
                resolved.insert(stringref, pair);
            }
            tracing::debug!("Resolved {} talk table strings", resolved.len());
            Ok(resolved)
        })
    }

    /// Number of entries in the table.
    ///
    /// # Errors
    /// Returns an error if the source cannot be opened or is corrupt.
    pub fn size(&self) -> Result<usize> {
        self.with_reader(|_, header| Ok(header.entry_count as usize))
    }

    /// Language the table is written in.
    ///
    /// # Errors
    /// Returns an error if the source cannot be opened or is corrupt.
    pub fn language(&self) -> Result<Language> {
        self.with_reader(|_, header| Ok(header.language))
    }

    /// Opens the source, reads the header and hands both to `f`. The handle
    /// is dropped when this returns.
    fn with_reader<T>(&self, f: impl FnOnce(&mut dyn ReadSeek, &TlkHeader) -> Result<T>) -> Result<T> {
        let mut reader: Box<dyn ReadSeek> = match &self.source {
            TlkSource::File(path) => Box::new(BufReader::new(File::open(path)?)),
            TlkSource::Memory(data) => Box::new(Cursor::new(Arc::clone(data))),
        };
        let header = read_header(&mut *reader)?;
        f(&mut *reader, &header)
    }
}

fn truncated(offset: u64, what: &str) -> impl FnOnce(io::Error) -> Error + '_ {
    move |err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::corrupt("TLK", offset, format!("data ends inside {what}"))
        } else {
            Error::Io(err)
        }
    }
}

fn read_header(reader: &mut dyn ReadSeek) -> Result<TlkHeader> {
    let mut magic = [0u8; 4];
    let mut version = [0u8; 4];
    reader.read_exact(&mut magic).map_err(truncated(0, "header"))?;
    if &magic != MAGIC {
        return Err(Error::corrupt("TLK", 0, format!("bad magic {magic:?}")));
    }
    reader.read_exact(&mut version).map_err(truncated(4, "header"))?;

    let language_id = reader.read_u32::<LittleEndian>().map_err(truncated(8, "header"))?;
    let entry_count = reader.read_u32::<LittleEndian>().map_err(truncated(12, "header"))?;
    let texts_offset = reader.read_u32::<LittleEndian>().map_err(truncated(16, "header"))?;

    Ok(TlkHeader {
        language: Language::from_id(language_id),
        entry_count,
        texts_offset,
    })
}

/// Reads the entry for `stringref`, or `None` when it is out of range.
fn read_raw_entry(reader: &mut dyn ReadSeek, header: &TlkHeader, stringref: i32) -> Result<Option<RawEntry>> {
    if stringref < 0 || stringref as u32 >= header.entry_count {
        return Ok(None);
    }
    let offset = HEADER_SIZE + u64::from(stringref as u32) * ENTRY_SIZE;
    reader.seek(SeekFrom::Start(offset))?;

    let mut entry = [0u8; ENTRY_SIZE as usize];
    reader
        .read_exact(&mut entry)
        .map_err(truncated(offset, "entry table"))?;
    let mut cursor = Cursor::new(&entry[..]);

    let flags = cursor.read_u32::<LittleEndian>()?;
    let mut sound = [0u8; ResRef::MAX_LENGTH];
    cursor.read_exact(&mut sound)?;
    Ok(Some(RawEntry {
        flags,
        sound: ResRef::new(decode_text(&sound, WINDOWS_1252)),
        volume_variance: cursor.read_u32::<LittleEndian>()?,
        pitch_variance: cursor.read_u32::<LittleEndian>()?,
        text_offset: cursor.read_u32::<LittleEndian>()?,
        text_length: cursor.read_u32::<LittleEndian>()?,
        sound_length: cursor.read_f32::<LittleEndian>()?,
    }))
}

fn read_text(reader: &mut dyn ReadSeek, header: &TlkHeader, raw: &RawEntry) -> Result<String> {
    if raw.text_length == 0 {
        return Ok(String::new());
    }
    let offset = u64::from(header.texts_offset) + u64::from(raw.text_offset);
    reader.seek(SeekFrom::Start(offset))?;

    let mut text = Vec::new();
    let read = reader
        .take(u64::from(raw.text_length))
        .read_to_end(&mut text)?;
    if read < raw.text_length as usize {
        return Err(Error::corrupt(
            "TLK",
            offset,
            format!("text of {} bytes runs past end of data", raw.text_length),
        ));
    }
    Ok(decode_text(&text, header.language.encoding()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a talk table from `(text, sound)` pairs.
    fn build_tlk(language: Language, entries: &[(&str, &str)]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"TLK V3.0");
        data.extend_from_slice(&language.id().to_le_bytes());
        data.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        let texts_offset = 20 + entries.len() as u32 * 40;
        data.extend_from_slice(&texts_offset.to_le_bytes());

        let mut texts = Vec::new();
        for (text, sound) in entries {
            let mut flags = TlkEntry::TEXT_PRESENT;
            if !sound.is_empty() {
                flags |= TlkEntry::SOUND_PRESENT;
            }
            data.extend_from_slice(&flags.to_le_bytes());
            let mut raw_sound = [0u8; 16];
            raw_sound[..sound.len()].copy_from_slice(sound.as_bytes());
            data.extend_from_slice(&raw_sound);
            data.extend_from_slice(&0u32.to_le_bytes());
            data.extend_from_slice(&0u32.to_le_bytes());
            data.extend_from_slice(&(texts.len() as u32).to_le_bytes());
            data.extend_from_slice(&(text.len() as u32).to_le_bytes());
            data.extend_from_slice(&0.0f32.to_le_bytes());
            texts.extend_from_slice(text.as_bytes());
        }
        data.extend_from_slice(&texts);
        data
    }

    fn sample() -> TalkTable {
        TalkTable::from_bytes(build_tlk(
            Language::English,
            &[("abcdef", "resref01"), ("ghijklmnop", "resref02"), ("qrstuvwxyz", "")],
        ))
    }

    #[test]
    fn test_strings_and_sounds() {
        let tlk = sample();
        assert_eq!(tlk.size().unwrap(), 3);
        assert_eq!(tlk.language().unwrap(), Language::English);
        assert_eq!(tlk.string(0).unwrap(), "abcdef");
        assert_eq!(tlk.sound(0).unwrap(), "resref01");
        assert_eq!(tlk.string(1).unwrap(), "ghijklmnop");
        assert_eq!(tlk.sound(1).unwrap(), "resref02");
        assert_eq!(tlk.string(2).unwrap(), "qrstuvwxyz");
        assert_eq!(tlk.sound(2).unwrap().to_string(), "");
    }

    #[test]
    fn test_out_of_range_sentinels() {
        let tlk = sample();
        assert_eq!(tlk.string(-1).unwrap(), "");
        assert_eq!(tlk.string(3).unwrap(), "");
        assert!(tlk.sound(-1).unwrap().is_blank());
        assert!(tlk.sound(3).unwrap().is_blank());
        assert_eq!(tlk.entry(99).unwrap(), TlkEntry::default());
    }

    #[test]
    fn test_batch_matches_single_lookups() {
        let tlk = sample();
        let batch = tlk.batch(&[2, 0, -1, 3]).unwrap();
        assert_eq!(batch.len(), 4);
        for stringref in [2, 0, -1, 3] {
            let (text, sound) = &batch[&stringref];
            assert_eq!(*text, tlk.string(stringref).unwrap());
            assert_eq!(*sound, tlk.sound(stringref).unwrap());
        }
    }

    #[test]
    fn test_entry_flags() {
        let entry = sample().entry(1).unwrap();
        assert!(entry.has_text());
        assert!(entry.has_sound());
        assert_eq!(entry.text, "ghijklmnop");
        assert!(!sample().entry(2).unwrap().has_sound());
    }

    #[test]
    fn test_file_backed_reads_are_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dialog.tlk");
        std::fs::write(&path, build_tlk(Language::English, &[("old", "")])).unwrap();

        let tlk = TalkTable::new(&path);
        assert_eq!(tlk.string(0).unwrap(), "old");
        std::fs::write(&path, build_tlk(Language::French, &[("neuf", "")])).unwrap();
        assert_eq!(tlk.string(0).unwrap(), "neuf");
        assert_eq!(tlk.language().unwrap(), Language::French);
    }

    #[test]
    fn test_corrupt_sources() {
        assert!(matches!(
            TalkTable::from_bytes(b"XLK V3.0".to_vec()).size(),
            Err(Error::CorruptFormat { .. })
        ));
        assert!(matches!(
            TalkTable::from_bytes(b"TLK V3.0\0\0".to_vec()).size(),
            Err(Error::CorruptFormat { offset: 8, .. })
        ));

        let mut data = build_tlk(Language::English, &[("abcdef", "")]);
        data.truncate(data.len() - 2);
        assert!(matches!(TalkTable::from_bytes(data).string(0), Err(Error::CorruptFormat { .. })));
        assert!(TalkTable::new("/nonexistent/dialog.tlk").size().is_err());
    }
}
