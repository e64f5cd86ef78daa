//! SSF V1.1 binary layout

use super::{Ssf, SsfSound};
use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};

pub(super) const MAGIC: &[u8; 4] = b"SSF ";
const VERSION: &[u8; 4] = b"V1.1";
const TABLE_OFFSET: u32 = 12;
const PADDING_WORDS: usize = 8;

/// Size of every file this writer produces.
pub const SSF_FILE_SIZE: usize = 12 + (SsfSound::COUNT + PADDING_WORDS) * 4;

/// Parse a binary SSF
///
/// # Errors
/// Returns [`Error::CorruptFormat`] for a bad header or a truncated table.
pub fn parse_ssf_bytes(data: &[u8]) -> Result<Ssf> {
    let mut cursor = Cursor::new(data);
    let mut magic = [0u8; 4];
    let mut version = [0u8; 4];
    cursor
        .read_exact(&mut magic)
        .and_then(|()| cursor.read_exact(&mut version))
        .map_err(|_| Error::corrupt("SSF", 0, "truncated header"))?;
    if &magic != MAGIC {
        return Err(Error::corrupt("SSF", 0, format!("bad magic {magic:?}")));
    }
    if &version != VERSION {
        return Err(Error::corrupt("SSF", 4, format!("unsupported version {version:?}")));
    }

    let table_offset = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| Error::corrupt("SSF", 8, "truncated header"))?;
    cursor.set_position(u64::from(table_offset));

    let mut ssf = Ssf::new();
    for sound in SsfSound::ALL {
        let position = cursor.position();
        let stringref = cursor.read_u32::<LittleEndian>().map_err(|_| {
            Error::corrupt("SSF", position, format!("sound table ends before {sound}"))
        })?;
        ssf.set(sound, stringref);
    }
    Ok(ssf)
}

/// Serialize an SSF to its binary form
///
/// # Errors
/// Only fails if writing to the in-memory buffer fails.
pub fn serialize_ssf(ssf: &Ssf) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(SSF_FILE_SIZE);
    output.extend_from_slice(MAGIC);
    output.extend_from_slice(VERSION);
    output.write_u32::<LittleEndian>(TABLE_OFFSET)?;
    for (_, stringref) in ssf.iter() {
        output.write_u32::<LittleEndian>(stringref)?;
    }
    for _ in 0..PADDING_WORDS {
        output.write_u32::<LittleEndian>(Ssf::UNUSED)?;
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_size_and_layout() {
        let mut ssf = Ssf::new();
        ssf.set(SsfSound::BATTLE_CRY_1, 1);
        ssf.set(SsfSound::POISONED, 28);
        let data = serialize_ssf(&ssf).unwrap();

        assert_eq!(data.len(), SSF_FILE_SIZE);
        assert_eq!(data.len(), 156);
        assert_eq!(&data[0..8], b"SSF V1.1");
        assert_eq!(&data[8..12], &12u32.to_le_bytes());
        assert_eq!(&data[12..16], &1u32.to_le_bytes());
        assert_eq!(&data[120..124], &28u32.to_le_bytes());
        assert!(data[124..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_round_trip() {
        let mut ssf = Ssf::new();
        for (i, sound) in SsfSound::ALL.into_iter().enumerate() {
            ssf.set(sound, i as u32 * 100);
        }
        assert_eq!(parse_ssf_bytes(&serialize_ssf(&ssf).unwrap()).unwrap(), ssf);
    }

    #[test]
    fn test_truncated_table() {
        let data = serialize_ssf(&Ssf::new()).unwrap();
        let err = parse_ssf_bytes(&data[..40]).unwrap_err();
        assert!(matches!(err, Error::CorruptFormat { offset: 40, .. }), "{err}");
        assert!(matches!(parse_ssf_bytes(b"SSF "), Err(Error::CorruptFormat { .. })));
        assert!(matches!(parse_ssf_bytes(b"SSF V9.9\x0c\0\0\0"), Err(Error::CorruptFormat { offset: 4, .. })));
    }
}
