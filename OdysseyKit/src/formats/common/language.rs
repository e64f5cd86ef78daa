//! Languages, genders and the 8-bit code pages the engine stores text in

use crate::error::{Error, Result};
use encoding_rs::{BIG5, EUC_KR, Encoding, GBK, SHIFT_JIS, WINDOWS_1250, WINDOWS_1252};
use serde::{Deserialize, Serialize};

/// Talk table and localized string languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    French,
    German,
    Italian,
    Spanish,
    Polish,
    Korean,
    ChineseTraditional,
    ChineseSimplified,
    Japanese,
    /// Any id the engine does not define.
    Unknown,
}

impl Language {
    /// Numeric id used on disk.
    #[must_use]
    pub fn id(self) -> u32 {
        match self {
            Language::English => 0,
            Language::French => 1,
            Language::German => 2,
            Language::Italian => 3,
            Language::Spanish => 4,
            Language::Polish => 5,
            Language::Korean => 128,
            Language::ChineseTraditional => 129,
            Language::ChineseSimplified => 130,
            Language::Japanese => 131,
            Language::Unknown => 0x7FFF_FFFE,
        }
    }

    #[must_use]
    pub fn from_id(id: u32) -> Self {
        match id {
            0 => Language::English,
            1 => Language::French,
            2 => Language::German,
            3 => Language::Italian,
            4 => Language::Spanish,
            5 => Language::Polish,
            128 => Language::Korean,
            129 => Language::ChineseTraditional,
            130 => Language::ChineseSimplified,
            131 => Language::Japanese,
            _ => Language::Unknown,
        }
    }

    /// Code page used for text in this language.
    #[must_use]
    pub fn encoding(self) -> &'static Encoding {
        match self {
            Language::Polish => WINDOWS_1250,
            Language::Korean => EUC_KR,
            Language::ChineseTraditional => BIG5,
            Language::ChineseSimplified => GBK,
            Language::Japanese => SHIFT_JIS,
            _ => WINDOWS_1252,
        }
    }
}

/// Speaker gender of a localized substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    #[must_use]
    pub fn id(self) -> u32 {
        match self {
            Gender::Male => 0,
            Gender::Female => 1,
        }
    }

    #[must_use]
    pub fn from_id(id: u32) -> Self {
        if id & 1 == 1 { Gender::Female } else { Gender::Male }
    }
}

/// Decode engine text, dropping anything after an embedded NUL.
pub(crate) fn decode_text(bytes: &[u8], encoding: &'static Encoding) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let (text, _, _) = encoding.decode(&bytes[..end]);
    text.into_owned()
}

/// Encode text for the engine.
///
/// # Errors
/// Returns [`Error::UnencodableText`] if the code page cannot represent every
/// character of `text`.
pub(crate) fn encode_text(text: &str, encoding: &'static Encoding) -> Result<Vec<u8>> {
    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(Error::UnencodableText {
            text: text.to_string(),
            encoding: encoding.name(),
        });
    }
    Ok(bytes.into_owned())
}
