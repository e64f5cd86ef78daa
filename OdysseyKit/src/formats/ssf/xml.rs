//! SSF XML representation
//!
//! ```xml
//! <xml>
//!   <sound id="0" label="BATTLE_CRY_1" strref="1234"/>
//!   <sound id="1" label="BATTLE_CRY_2" strref="-1"/>
//! </xml>
//! ```
//!
//! On read, `id` selects the slot; the label is informational.

use super::{Ssf, SsfSound};
use crate::error::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

/// Serialize an SSF to an XML string
///
/// # Errors
/// Returns an error if XML serialization fails.
pub fn ssf_to_xml(ssf: &Ssf) -> Result<String> {
    let mut output = Vec::new();
    let mut writer = Writer::new_with_indent(&mut output, b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("xml")))?;

    for (sound, stringref) in ssf.iter() {
        let strref = if stringref == Ssf::UNUSED {
            "-1".to_string()
        } else {
            stringref.to_string()
        };
        let mut element = BytesStart::new("sound");
        element.push_attribute(("id", sound.index().to_string().as_str()));
        element.push_attribute(("label", sound.label().as_str()));
        element.push_attribute(("strref", strref.as_str()));
        writer.write_event(Event::Empty(element))?;
    }

    writer.write_event(Event::End(BytesEnd::new("xml")))?;
    Ok(String::from_utf8(output)?)
}

/// Parse an SSF from an XML string
///
/// Slots without a `<sound>` element stay unused.
///
/// # Errors
/// Returns [`Error::InvalidSsfXml`] for a missing or out-of-range `id` or an
/// unparseable `strref`.
pub fn parse_ssf_xml(content: &str) -> Result<Ssf> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut ssf = Ssf::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"sound" => {
                let mut id = None;
                let mut strref = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    let value = attr.unescape_value()?;
                    match attr.key.as_ref() {
                        b"id" => id = Some(value.trim().to_string()),
                        b"strref" => strref = Some(value.trim().to_string()),
                        _ => {}
                    }
                }

                let id = id.ok_or_else(|| Error::InvalidSsfXml("<sound> without id".to_string()))?;
                let sound = id
                    .parse::<usize>()
                    .ok()
                    .and_then(SsfSound::from_index)
                    .ok_or_else(|| Error::InvalidSsfXml(format!("invalid sound id '{id}'")))?;
                let stringref = match strref.as_deref() {
                    None | Some("-1") => Ssf::UNUSED,
                    Some(value) => value
                        .parse()
                        .map_err(|_| Error::InvalidSsfXml(format!("invalid strref '{value}' for {sound}")))?,
                };
                ssf.set(sound, stringref);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(ssf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_sentinel() {
        let mut ssf = Ssf::new();
        ssf.set(SsfSound::SELECT_2, 4321);
        let xml = ssf_to_xml(&ssf).unwrap();

        assert!(xml.contains(r#"<sound id="7" label="SELECT_2" strref="4321"/>"#));
        assert!(xml.contains(r#"<sound id="0" label="BATTLE_CRY_1" strref="-1"/>"#));
        assert_eq!(parse_ssf_xml(&xml).unwrap(), ssf);
    }

    #[test]
    fn test_missing_sounds_stay_unused() {
        let ssf = parse_ssf_xml(r#"<xml><sound id="15" label="DEAD" strref="9"/></xml>"#).unwrap();
        assert_eq!(ssf.get(SsfSound::DEAD), 9);
        assert_eq!(ssf.get(SsfSound::POISONED), Ssf::UNUSED);
    }

    #[test]
    fn test_invalid_ids() {
        assert!(matches!(
            parse_ssf_xml(r#"<xml><sound id="28" strref="1"/></xml>"#),
            Err(Error::InvalidSsfXml(_))
        ));
        assert!(matches!(
            parse_ssf_xml(r#"<xml><sound strref="1"/></xml>"#),
            Err(Error::InvalidSsfXml(_))
        ));
        assert!(matches!(
            parse_ssf_xml(r#"<xml><sound id="1" strref="abc"/></xml>"#),
            Err(Error::InvalidSsfXml(_))
        ));
    }
}
