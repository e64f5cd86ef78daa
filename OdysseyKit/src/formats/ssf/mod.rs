//! SSF (sound set) codec
//!
//! A sound set maps the 28 creature barks (battle cries, pain grunts, lock
//! picking remarks...) to talk table string references.

mod binary;
mod xml;

use crate::error::{Error, Result};
use crate::formats::common::ResourceFormat;
use std::fmt;
use std::path::Path;

pub use binary::{SSF_FILE_SIZE, parse_ssf_bytes, serialize_ssf};
pub use xml::{parse_ssf_xml, ssf_to_xml};

/// One slot of a sound set, in on-disk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(non_camel_case_types)]
pub enum SsfSound {
    BATTLE_CRY_1,
    BATTLE_CRY_2,
    BATTLE_CRY_3,
    BATTLE_CRY_4,
    BATTLE_CRY_5,
    BATTLE_CRY_6,
    SELECT_1,
    SELECT_2,
    SELECT_3,
    ATTACK_GRUNT_1,
    ATTACK_GRUNT_2,
    ATTACK_GRUNT_3,
    PAIN_GRUNT_1,
    PAIN_GRUNT_2,
    LOW_HEALTH,
    DEAD,
    CRITICAL_HIT,
    TARGET_IMMUNE,
    LAY_MINE,
    DISARM_MINE,
    BEGIN_STEALTH,
    BEGIN_SEARCH,
    BEGIN_UNLOCK,
    UNLOCK_FAILED,
    UNLOCK_SUCCESS,
    SEPARATED_FROM_PARTY,
    REJOINED_PARTY,
    POISONED,
}

impl SsfSound {
    pub const COUNT: usize = 28;

    pub const ALL: [SsfSound; Self::COUNT] = [
        SsfSound::BATTLE_CRY_1,
        SsfSound::BATTLE_CRY_2,
        SsfSound::BATTLE_CRY_3,
        SsfSound::BATTLE_CRY_4,
        SsfSound::BATTLE_CRY_5,
        SsfSound::BATTLE_CRY_6,
        SsfSound::SELECT_1,
        SsfSound::SELECT_2,
        SsfSound::SELECT_3,
        SsfSound::ATTACK_GRUNT_1,
        SsfSound::ATTACK_GRUNT_2,
        SsfSound::ATTACK_GRUNT_3,
        SsfSound::PAIN_GRUNT_1,
        SsfSound::PAIN_GRUNT_2,
        SsfSound::LOW_HEALTH,
        SsfSound::DEAD,
        SsfSound::CRITICAL_HIT,
        SsfSound::TARGET_IMMUNE,
        SsfSound::LAY_MINE,
        SsfSound::DISARM_MINE,
        SsfSound::BEGIN_STEALTH,
        SsfSound::BEGIN_SEARCH,
        SsfSound::BEGIN_UNLOCK,
        SsfSound::UNLOCK_FAILED,
        SsfSound::UNLOCK_SUCCESS,
        SsfSound::SEPARATED_FROM_PARTY,
        SsfSound::REJOINED_PARTY,
        SsfSound::POISONED,
    ];

    /// Slot position in the file.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The name used for the XML `label` attribute.
    #[must_use]
    pub fn label(self) -> String {
        format!("{self:?}")
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sound| sound.label() == label)
    }
}

impl fmt::Display for SsfSound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A sound set: one talk table reference per [`SsfSound`].
///
/// `0xFFFFFFFF` marks an unused slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ssf {
    sounds: [u32; SsfSound::COUNT],
}

impl Default for Ssf {
    fn default() -> Self {
        Ssf {
            sounds: [Ssf::UNUSED; SsfSound::COUNT],
        }
    }
}

impl Ssf {
    /// String reference of an empty slot.
    pub const UNUSED: u32 = 0xFFFF_FFFF;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, sound: SsfSound) -> u32 {
        self.sounds[sound.index()]
    }

    pub fn set(&mut self, sound: SsfSound, stringref: u32) {
        self.sounds[sound.index()] = stringref;
    }

    /// Clears every slot back to [`Ssf::UNUSED`].
    pub fn reset(&mut self) {
        self.sounds = [Ssf::UNUSED; SsfSound::COUNT];
    }

    /// `(sound, stringref)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SsfSound, u32)> + '_ {
        SsfSound::ALL.into_iter().zip(self.sounds.iter().copied())
    }
}

/// Sniff the encoding of SSF data starting at `offset`.
#[must_use]
pub fn detect_ssf(data: &[u8], offset: usize) -> ResourceFormat {
    let Some(head) = data.get(offset..offset.saturating_add(4)) else {
        return ResourceFormat::Invalid;
    };
    if head == binary::MAGIC {
        ResourceFormat::Ssf
    } else if head.contains(&b'<') {
        ResourceFormat::SsfXml
    } else {
        ResourceFormat::Invalid
    }
}

/// Read an SSF file in whichever encoding it uses
///
/// # Errors
/// Returns [`Error::UnsupportedFormat`] when the encoding cannot be detected,
/// or any error from the matching codec.
pub fn read_ssf<P: AsRef<Path>>(path: P) -> Result<Ssf> {
    let data = std::fs::read(path)?;
    parse_ssf(&data)
}

/// Parse SSF data in whichever encoding it uses
///
/// # Errors
/// Returns [`Error::UnsupportedFormat`] when the encoding cannot be detected,
/// or any error from the matching codec.
pub fn parse_ssf(data: &[u8]) -> Result<Ssf> {
    match detect_ssf(data, 0) {
        ResourceFormat::Ssf => parse_ssf_bytes(data),
        ResourceFormat::SsfXml => parse_ssf_xml(std::str::from_utf8(data)?),
        other => Err(Error::UnsupportedFormat(format!("cannot read SSF from {other} data"))),
    }
}

/// Write an SSF file in the requested encoding
///
/// # Errors
/// Returns [`Error::UnsupportedFormat`] for a non-SSF target format.
pub fn write_ssf<P: AsRef<Path>>(ssf: &Ssf, path: P, format: ResourceFormat) -> Result<()> {
    let data = bytes_ssf(ssf, format)?;
    std::fs::write(path, data)?;
    Ok(())
}

/// Encode an SSF in the requested encoding
///
/// # Errors
/// Returns [`Error::UnsupportedFormat`] for a non-SSF target format.
pub fn bytes_ssf(ssf: &Ssf, format: ResourceFormat) -> Result<Vec<u8>> {
    match format {
        ResourceFormat::Ssf => serialize_ssf(ssf),
        ResourceFormat::SsfXml => Ok(ssf_to_xml(ssf)?.into_bytes()),
        other => Err(Error::UnsupportedFormat(format!("cannot write SSF as {other}"))),
    }
}
