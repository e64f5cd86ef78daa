//! GFF XML representation
//!
//! One `<struct>` element per struct and one element per field, named after
//! the field type and carrying a `label` attribute:
//!
//! ```xml
//! <gff3 type="DLG ">
//!   <struct id="-1">
//!     <dword label="NumWords">12</dword>
//!     <locstring label="Text" strref="-1">
//!       <string language="0" gender="0">Hello there.</string>
//!     </locstring>
//!     <vector label="FadeColor"><double>1</double>...</vector>
//!     <list label="StartingList">
//!       <struct id="0">...</struct>
//!     </list>
//!   </struct>
//! </gff3>
//! ```

mod reader;
mod writer;

pub use reader::{parse_gff_xml, read_gff_xml};
pub use writer::{gff_to_xml, write_gff_xml};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::formats::common::{Gender, Language, LocalizedString, ResRef};
    use crate::formats::gff::{Gff, GffContent, GffList, GffStruct, GffValue};
    use glam::{Vec3, Vec4};
    use pretty_assertions::assert_eq;

    fn sample() -> Gff {
        let mut gff = Gff::new(GffContent::Dlg);
        let root = &mut gff.root;
        root.set_uint8("Byte", 7);
        root.set_int8("Char", -3);
        root.set_uint16("Word", 65535);
        root.set_int16("Short", -2);
        root.set_uint32("DWord", 0xFFFF_FFFF);
        root.set_int32("Int", -1);
        root.set_uint64("DWord64", u64::MAX);
        root.set_int64("Int64", i64::MIN);
        root.set_single("Float", 0.1);
        root.set_double("Double", 1.0 / 3.0);
        root.set_string("Text", "  <leading> & \"trailing\"  ");
        root.set_string("Empty", "");
        root.set_resref("Script", "k_act_talk");
        let mut locstring = LocalizedString::new(42);
        locstring.set(Language::English, Gender::Male, "Hello");
        locstring.set(Language::German, Gender::Female, "Hallo");
        root.set_locstring("LocString", locstring);
        root.set_binary("Data", vec![0xDE, 0xAD, 0xBE, 0xEF]);
        root.set_vector3("Position", Vec3::new(1.5, -2.0, 0.0));
        root.set_vector4("Orientation", Vec4::new(0.0, 0.0, 0.707_106_77, 0.707_106_77));
        root.set_struct("Child", GffStruct::new(9)).set_uint8("Inner", 1);
        root.set_struct("EmptyChild", GffStruct::new(3));
        let list = root.set_list("List", GffList::new());
        list.add(0).set_resref("Sound", "");
        list.add(1);
        root.set_list("EmptyList", GffList::new());
        gff
    }

    #[test]
    fn test_round_trip() {
        let gff = sample();
        let xml = gff_to_xml(&gff).unwrap();
        let parsed = parse_gff_xml(&xml).unwrap();
        assert_eq!(parsed, gff);
    }

    #[test]
    fn test_serialization_is_idempotent() {
        let xml = gff_to_xml(&sample()).unwrap();
        let again = gff_to_xml(&parse_gff_xml(&xml).unwrap()).unwrap();
        assert_eq!(xml, again);
    }

    #[test]
    fn test_element_shapes() {
        let xml = gff_to_xml(&sample()).unwrap();
        assert!(xml.contains(r#"<gff3 type="DLG ">"#));
        assert!(xml.contains(r#"<byte label="Byte">7</byte>"#));
        assert!(xml.contains(r#"<data label="Data">3q2+7w==</data>"#));
        assert!(xml.contains(r#"<locstring label="LocString" strref="42">"#));
        assert!(xml.contains(r#"<string language="2" gender="1">Hallo</string>"#));
        assert!(xml.contains(r#"<struct label="Child" id="9">"#));
        assert!(xml.contains(r#"<list label="EmptyList"/>"#));
    }

    #[test]
    fn test_root_name_ignored_and_type_defaults() {
        let gff = parse_gff_xml(r#"<anything><struct id="-1"><int label="A">5</int></struct></anything>"#).unwrap();
        assert_eq!(gff.content, GffContent::Gff);
        assert_eq!(gff.root.get("A"), Some(&GffValue::Int32(5)));
    }

    #[test]
    fn test_empty_and_expanded_forms_match() {
        let compact = parse_gff_xml(r#"<gff3 type="UTI "><struct id="-1"><resref label="R"/></struct></gff3>"#).unwrap();
        let expanded = parse_gff_xml(r#"<gff3 type="UTI "><struct id="-1"><resref label="R"></resref></struct></gff3>"#).unwrap();
        assert_eq!(compact, expanded);
        assert_eq!(compact.root.acquire("R", ResRef::new("x")), ResRef::blank());
    }

    #[test]
    fn test_oversized_language_rejected() {
        let xml = r#"<gff3><struct id="-1"><locstring label="L" strref="-1"><string language="2147483648" gender="0">x</string></locstring></struct></gff3>"#;
        assert!(matches!(parse_gff_xml(xml), Err(Error::XmlAttrError(_))));
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            parse_gff_xml(r#"<gff3><struct id="-1"><bogus label="A">1</bogus></struct></gff3>"#),
            Err(Error::InvalidGffXml(_))
        ));
        assert!(matches!(
            parse_gff_xml(r#"<gff3><struct id="-1"><byte label="A">300</byte></struct></gff3>"#),
            Err(Error::InvalidGffXml(_))
        ));
        assert!(matches!(
            parse_gff_xml(r#"<gff3><struct id="-1"><byte>1</byte></struct></gff3>"#),
            Err(Error::InvalidGffXml(_))
        ));
        assert!(matches!(parse_gff_xml("<gff3></gff3>"), Err(Error::InvalidGffXml(_))));
    }
}
