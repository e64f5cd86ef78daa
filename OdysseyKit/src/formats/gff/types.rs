//! GFF field types and content tags

use std::fmt;

/// Type of a GFF field, with the numeric id used in the binary field array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GffFieldType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Single,
    Double,
    String,
    ResRef,
    LocalizedString,
    Binary,
    Struct,
    List,
    Vector4,
    Vector3,
}

impl GffFieldType {
    #[must_use]
    pub fn id(self) -> u32 {
        match self {
            GffFieldType::UInt8 => 0,
            GffFieldType::Int8 => 1,
            GffFieldType::UInt16 => 2,
            GffFieldType::Int16 => 3,
            GffFieldType::UInt32 => 4,
            GffFieldType::Int32 => 5,
            GffFieldType::UInt64 => 6,
            GffFieldType::Int64 => 7,
            GffFieldType::Single => 8,
            GffFieldType::Double => 9,
            GffFieldType::String => 10,
            GffFieldType::ResRef => 11,
            GffFieldType::LocalizedString => 12,
            GffFieldType::Binary => 13,
            GffFieldType::Struct => 14,
            GffFieldType::List => 15,
            GffFieldType::Vector4 => 16,
            GffFieldType::Vector3 => 17,
        }
    }

    #[must_use]
    pub fn from_id(id: u32) -> Option<Self> {
        Some(match id {
            0 => GffFieldType::UInt8,
            1 => GffFieldType::Int8,
            2 => GffFieldType::UInt16,
            3 => GffFieldType::Int16,
            4 => GffFieldType::UInt32,
            5 => GffFieldType::Int32,
            6 => GffFieldType::UInt64,
            7 => GffFieldType::Int64,
            8 => GffFieldType::Single,
            9 => GffFieldType::Double,
            10 => GffFieldType::String,
            11 => GffFieldType::ResRef,
            12 => GffFieldType::LocalizedString,
            13 => GffFieldType::Binary,
            14 => GffFieldType::Struct,
            15 => GffFieldType::List,
            16 => GffFieldType::Vector4,
            17 => GffFieldType::Vector3,
            _ => return None,
        })
    }

    /// Struct and list fields nest other structs.
    #[must_use]
    pub fn is_complex(self) -> bool {
        matches!(self, GffFieldType::Struct | GffFieldType::List)
    }

    /// Values that fit in the 4-byte data slot of a field entry.
    #[must_use]
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            GffFieldType::UInt8
                | GffFieldType::Int8
                | GffFieldType::UInt16
                | GffFieldType::Int16
                | GffFieldType::UInt32
                | GffFieldType::Int32
                | GffFieldType::Single
        )
    }

    /// Element name used by the XML representation.
    #[must_use]
    pub fn xml_name(self) -> &'static str {
        match self {
            GffFieldType::UInt8 => "byte",
            GffFieldType::Int8 => "char",
            GffFieldType::UInt16 => "word",
            GffFieldType::Int16 => "short",
            GffFieldType::UInt32 => "dword",
            GffFieldType::Int32 => "int",
            GffFieldType::UInt64 => "dword64",
            GffFieldType::Int64 => "int64",
            GffFieldType::Single => "float",
            GffFieldType::Double => "double",
            GffFieldType::String => "exostring",
            GffFieldType::ResRef => "resref",
            GffFieldType::LocalizedString => "locstring",
            GffFieldType::Binary => "data",
            GffFieldType::Struct => "struct",
            GffFieldType::List => "list",
            GffFieldType::Vector4 => "orientation",
            GffFieldType::Vector3 => "vector",
        }
    }

    #[must_use]
    pub fn from_xml_name(name: &str) -> Option<Self> {
        Some(match name {
            "byte" => GffFieldType::UInt8,
            "char" => GffFieldType::Int8,
            "word" => GffFieldType::UInt16,
            "short" => GffFieldType::Int16,
            "dword" => GffFieldType::UInt32,
            "int" => GffFieldType::Int32,
            "dword64" => GffFieldType::UInt64,
            "int64" => GffFieldType::Int64,
            "float" => GffFieldType::Single,
            "double" => GffFieldType::Double,
            "exostring" => GffFieldType::String,
            "resref" => GffFieldType::ResRef,
            "locstring" => GffFieldType::LocalizedString,
            "data" => GffFieldType::Binary,
            "struct" => GffFieldType::Struct,
            "list" => GffFieldType::List,
            "orientation" => GffFieldType::Vector4,
            "vector" => GffFieldType::Vector3,
            _ => return None,
        })
    }
}

impl fmt::Display for GffFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The resource schema a GFF file holds, stored as a 4-byte tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum GffContent {
    #[default]
    Gff,
    Are,
    Bic,
    Dlg,
    Fac,
    Git,
    Gui,
    Ifo,
    Itp,
    Jrl,
    Pth,
    Utc,
    Utd,
    Ute,
    Uti,
    Utm,
    Utp,
    Uts,
    Utt,
    Utw,
    Nfo,
    Pt,
    Gvt,
    Inv,
    /// A tag this crate does not know, kept verbatim (already padded to 4 bytes).
    Other(String),
}

static KNOWN_CONTENT: [(GffContent, &str); 24] = [
    (GffContent::Gff, "GFF "),
    (GffContent::Are, "ARE "),
    (GffContent::Bic, "BIC "),
    (GffContent::Dlg, "DLG "),
    (GffContent::Fac, "FAC "),
    (GffContent::Git, "GIT "),
    (GffContent::Gui, "GUI "),
    (GffContent::Ifo, "IFO "),
    (GffContent::Itp, "ITP "),
    (GffContent::Jrl, "JRL "),
    (GffContent::Pth, "PTH "),
    (GffContent::Utc, "UTC "),
    (GffContent::Utd, "UTD "),
    (GffContent::Ute, "UTE "),
    (GffContent::Uti, "UTI "),
    (GffContent::Utm, "UTM "),
    (GffContent::Utp, "UTP "),
    (GffContent::Uts, "UTS "),
    (GffContent::Utt, "UTT "),
    (GffContent::Utw, "UTW "),
    (GffContent::Nfo, "NFO "),
    (GffContent::Pt, "PT  "),
    (GffContent::Gvt, "GVT "),
    (GffContent::Inv, "INV "),
];

impl GffContent {
    /// Parses a tag, padding or truncating it to 4 bytes. Unknown tags become
    /// [`GffContent::Other`].
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        let padded: String = format!("{tag:<4}").chars().take(4).collect();
        Self::known(&padded).unwrap_or(GffContent::Other(padded))
    }

    /// Looks up a known tag, case-sensitively.
    #[must_use]
    pub fn known(tag: &str) -> Option<Self> {
        KNOWN_CONTENT
            .iter()
            .find(|(_, known)| *known == tag)
            .map(|(content, _)| content.clone())
    }

    /// Whether the four bytes are one of the known tags.
    #[must_use]
    pub fn is_known_tag(bytes: &[u8]) -> bool {
        KNOWN_CONTENT
            .iter()
            .any(|(_, known)| known.as_bytes() == bytes)
    }

    /// The 4-byte tag written to disk.
    #[must_use]
    pub fn tag(&self) -> String {
        match self {
            GffContent::Other(tag) => format!("{tag:<4}").chars().take(4).collect(),
            known => KNOWN_CONTENT
                .iter()
                .find(|(content, _)| content == known)
                .map_or_else(|| "GFF ".to_string(), |(_, tag)| (*tag).to_string()),
        }
    }
}

impl fmt::Display for GffContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag().trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_ids() {
        for id in 0..18 {
            let field_type = GffFieldType::from_id(id).unwrap();
            assert_eq!(field_type.id(), id);
            assert_eq!(GffFieldType::from_xml_name(field_type.xml_name()), Some(field_type));
        }
        assert_eq!(GffFieldType::from_id(18), None);
    }

    #[test]
    fn test_content_tags() {
        assert_eq!(GffContent::from_tag("DLG "), GffContent::Dlg);
        assert_eq!(GffContent::from_tag("DLG"), GffContent::Dlg);
        assert_eq!(GffContent::Pt.tag(), "PT  ");
        assert_eq!(GffContent::from_tag("XYZ"), GffContent::Other("XYZ ".to_string()));
        assert_eq!(GffContent::from_tag("XYZ").tag(), "XYZ ");
        assert!(GffContent::is_known_tag(b"UTC "));
        assert!(!GffContent::is_known_tag(b"utc "));
    }
}
