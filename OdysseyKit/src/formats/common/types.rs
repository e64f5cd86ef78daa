//! Small value types shared by the GFF, DLG, SSF and TLK codecs

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A resource reference: a short, case-insensitive, filename-like name.
///
/// Construction never fails. Binary writers truncate to [`ResRef::MAX_LENGTH`]
/// bytes, which is what the engine does with over-long names as well.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResRef(String);

impl ResRef {
    /// Longest name the binary formats can hold.
    pub const MAX_LENGTH: usize = 16;

    /// Creates a resource reference from any string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        ResRef(value.into())
    }

    /// The empty resource reference.
    #[must_use]
    pub fn blank() -> Self {
        ResRef(String::new())
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name as it will be written to disk (at most 16 bytes, never
    /// splitting a character).
    #[must_use]
    pub fn truncated(&self) -> &str {
        if self.0.len() <= Self::MAX_LENGTH {
            return &self.0;
        }
        let mut end = Self::MAX_LENGTH;
        while !self.0.is_char_boundary(end) {
            end -= 1;
        }
        &self.0[..end]
    }
}

impl PartialEq for ResRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl std::hash::Hash for ResRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

impl PartialEq<str> for ResRef {
    fn eq(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq<&str> for ResRef {
    fn eq(&self, other: &&str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for ResRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResRef {
    fn from(value: &str) -> Self {
        ResRef(value.to_string())
    }
}

impl From<String> for ResRef {
    fn from(value: String) -> Self {
        ResRef(value)
    }
}

/// An RGBA colour with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color { r, g, b, a }
    }

    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color { r, g, b, a: 1.0 }
    }

    /// Reads a colour stored as a `Vector3` in blue, green, red order.
    #[must_use]
    pub fn from_bgr_vector3(v: Vec3) -> Self {
        Color::rgb(v.z, v.y, v.x)
    }

    /// The colour as a blue, green, red `Vector3`; alpha is dropped.
    #[must_use]
    pub fn bgr_vector3(&self) -> Vec3 {
        Vec3::new(self.b, self.g, self.r)
    }
}

/// Game version. Several GFF fields only exist in the sequel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Game {
    /// Knights of the Old Republic.
    #[default]
    K1,
    /// Knights of the Old Republic II: The Sith Lords.
    K2,
}

impl Game {
    #[must_use]
    pub fn is_k1(self) -> bool {
        self == Game::K1
    }

    #[must_use]
    pub fn is_k2(self) -> bool {
        self == Game::K2
    }
}

impl std::str::FromStr for Game {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "k1" | "kotor" | "kotor1" => Ok(Game::K1),
            "k2" | "tsl" | "kotor2" => Ok(Game::K2),
            _ => Err(format!("Invalid game '{s}'. Valid values: k1, k2")),
        }
    }
}

/// Encodings the GFF and SSF codecs can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFormat {
    Gff,
    GffXml,
    Ssf,
    SsfXml,
    /// The detector did not recognise the data.
    Invalid,
}

impl fmt::Display for ResourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceFormat::Gff => "gff",
            ResourceFormat::GffXml => "gff-xml",
            ResourceFormat::Ssf => "ssf",
            ResourceFormat::SsfXml => "ssf-xml",
            ResourceFormat::Invalid => "invalid",
        })
    }
}

impl std::str::FromStr for ResourceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gff" => Ok(ResourceFormat::Gff),
            "gff-xml" | "gffxml" | "xml" => Ok(ResourceFormat::GffXml),
            "ssf" => Ok(ResourceFormat::Ssf),
            "ssf-xml" | "ssfxml" => Ok(ResourceFormat::SsfXml),
            _ => Err(format!("Invalid format '{s}'. Valid values: gff, gff-xml, ssf, ssf-xml")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resref_case_insensitive() {
        assert_eq!(ResRef::new("NPC_Greet"), ResRef::new("npc_greet"));
        assert_eq!(ResRef::new("k_ai_master"), "K_AI_MASTER");
        assert_ne!(ResRef::new("a"), ResRef::new("b"));
    }

    #[test]
    fn test_resref_truncation() {
        let long = ResRef::new("this_name_is_far_too_long");
        assert_eq!(long.truncated(), "this_name_is_far");
        assert_eq!(ResRef::new("short").truncated(), "short");
        assert_eq!(ResRef::blank().to_string(), "");
        assert!(ResRef::blank().is_blank());
    }

    #[test]
    fn test_color_bgr_round_trip() {
        let color = Color::rgb(0.25, 0.5, 0.75);
        let v = color.bgr_vector3();
        assert_eq!(v, Vec3::new(0.75, 0.5, 0.25));
        assert_eq!(Color::from_bgr_vector3(v), color);
    }

    #[test]
    fn test_resource_format_names() {
        for format in [ResourceFormat::Gff, ResourceFormat::GffXml, ResourceFormat::Ssf, ResourceFormat::SsfXml] {
            assert_eq!(format.to_string().parse::<ResourceFormat>(), Ok(format));
        }
        assert!("invalid".parse::<ResourceFormat>().is_err());
    }
}
