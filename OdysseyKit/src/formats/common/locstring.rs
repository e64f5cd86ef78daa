//! Localized strings: a talk table reference plus per-language overrides

use super::language::{Gender, Language};
use std::collections::BTreeMap;
use std::fmt;

/// A talk table string reference plus any number of literal substrings keyed
/// by language and gender.
///
/// Substrings are keyed internally by their on-disk id
/// (`language * 2 + gender`) so ids the engine does not define survive a
/// round trip untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedString {
    /// Talk table index, `-1` when the string is not backed by the table.
    pub stringref: i32,
    substrings: BTreeMap<u32, String>,
}

impl Default for LocalizedString {
    fn default() -> Self {
        Self::from_invalid()
    }
}

impl LocalizedString {
    #[must_use]
    pub fn new(stringref: i32) -> Self {
        LocalizedString {
            stringref,
            substrings: BTreeMap::new(),
        }
    }

    /// A string with no talk table reference and no substrings.
    #[must_use]
    pub fn from_invalid() -> Self {
        Self::new(-1)
    }

    /// A string with a single English substring.
    #[must_use]
    pub fn from_english(text: impl Into<String>) -> Self {
        let mut locstring = Self::from_invalid();
        locstring.set(Language::English, Gender::Male, text);
        locstring
    }

    /// Packs a language and gender into a substring id.
    #[must_use]
    pub fn substring_id(language: Language, gender: Gender) -> u32 {
        language.id() * 2 + gender.id()
    }

    /// Splits a substring id into its language and gender.
    #[must_use]
    pub fn split_substring_id(id: u32) -> (Language, Gender) {
        (Language::from_id(id / 2), Gender::from_id(id))
    }

    #[must_use]
    pub fn get(&self, language: Language, gender: Gender) -> Option<&str> {
        self.substrings
            .get(&Self::substring_id(language, gender))
            .map(String::as_str)
    }

    pub fn set(&mut self, language: Language, gender: Gender, text: impl Into<String>) {
        self.substrings
            .insert(Self::substring_id(language, gender), text.into());
    }

    pub fn remove(&mut self, language: Language, gender: Gender) -> Option<String> {
        self.substrings.remove(&Self::substring_id(language, gender))
    }

    /// Raw access by substring id, used by the codecs.
    #[must_use]
    pub fn get_by_id(&self, id: u32) -> Option<&str> {
        self.substrings.get(&id).map(String::as_str)
    }

    pub fn set_by_id(&mut self, id: u32, text: impl Into<String>) {
        self.substrings.insert(id, text.into());
    }

    /// Substrings in ascending id order as `(id, text)`.
    pub fn iter_ids(&self) -> impl Iterator<Item = (u32, &str)> {
        self.substrings.iter().map(|(id, text)| (*id, text.as_str()))
    }

    /// Substrings in ascending id order as `(language, gender, text)`.
    pub fn iter(&self) -> impl Iterator<Item = (Language, Gender, &str)> {
        self.iter_ids().map(|(id, text)| {
            let (language, gender) = Self::split_substring_id(id);
            (language, gender, text)
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.substrings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.substrings.is_empty()
    }
}

impl fmt::Display for LocalizedString {
    /// The English text if present, else the first substring, else the
    /// string reference.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = self.get(Language::English, Gender::Male) {
            return f.write_str(text);
        }
        if let Some((_, text)) = self.iter_ids().next() {
            return f.write_str(text);
        }
        write!(f, "{}", self.stringref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_ids() {
        assert_eq!(LocalizedString::substring_id(Language::English, Gender::Male), 0);
        assert_eq!(LocalizedString::substring_id(Language::French, Gender::Female), 3);
        assert_eq!(
            LocalizedString::split_substring_id(257),
            (Language::Korean, Gender::Female)
        );
    }

    #[test]
    fn test_set_get_remove() {
        let mut locstring = LocalizedString::new(42);
        locstring.set(Language::German, Gender::Female, "Hallo");
        assert_eq!(locstring.get(Language::German, Gender::Female), Some("Hallo"));
        assert_eq!(locstring.get(Language::German, Gender::Male), None);
        assert_eq!(locstring.len(), 1);
        assert_eq!(locstring.remove(Language::German, Gender::Female).as_deref(), Some("Hallo"));
        assert!(locstring.is_empty());
    }

    #[test]
    fn test_display_fallbacks() {
        assert_eq!(LocalizedString::from_english("Hi").to_string(), "Hi");
        assert_eq!(LocalizedString::new(12).to_string(), "12");
    }
}
