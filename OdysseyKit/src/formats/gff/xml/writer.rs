//! GFF XML writing

use crate::error::Result;
use crate::formats::gff::document::{Gff, GffStruct, GffValue};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Write a GFF to disk as XML
///
/// # Errors
/// Returns an error if serialization or file writing fails.
pub fn write_gff_xml<P: AsRef<Path>>(gff: &Gff, path: P) -> Result<()> {
    let xml = gff_to_xml(gff)?;
    fs::write(path, xml)?;
    Ok(())
}

/// Serialize a GFF to an XML string
///
/// # Errors
/// Returns an error if XML serialization fails.
pub fn gff_to_xml(gff: &Gff) -> Result<String> {
    let mut output = Vec::new();
    let mut writer = Writer::new_with_indent(&mut output, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let tag = gff.content.tag();
    let mut root = BytesStart::new("gff3");
    root.push_attribute(("type", tag.as_str()));
    writer.write_event(Event::Start(root.borrow()))?;
    write_struct(&mut writer, &gff.root, None)?;
    writer.write_event(Event::End(BytesEnd::new("gff3")))?;

    Ok(String::from_utf8(output)?)
}

fn write_struct<W: Write>(
    writer: &mut Writer<W>,
    gff_struct: &GffStruct,
    label: Option<&str>,
) -> Result<()> {
    let id = gff_struct.struct_id.to_string();
    let mut start = BytesStart::new("struct");
    if let Some(label) = label {
        start.push_attribute(("label", label));
    }
    start.push_attribute(("id", id.as_str()));

    if gff_struct.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start.borrow()))?;
    for (field_label, value) in gff_struct.iter() {
        write_field(writer, field_label, value)?;
    }
    writer.write_event(Event::End(BytesEnd::new("struct")))?;
    Ok(())
}

fn write_field<W: Write>(writer: &mut Writer<W>, label: &str, value: &GffValue) -> Result<()> {
    let name = value.field_type().xml_name();
    let mut start = BytesStart::new(name);
    start.push_attribute(("label", label));

    let text = match value {
        GffValue::UInt8(v) => v.to_string(),
        GffValue::Int8(v) => v.to_string(),
        GffValue::UInt16(v) => v.to_string(),
        GffValue::Int16(v) => v.to_string(),
        GffValue::UInt32(v) => v.to_string(),
        GffValue::Int32(v) => v.to_string(),
        GffValue::UInt64(v) => v.to_string(),
        GffValue::Int64(v) => v.to_string(),
        GffValue::Single(v) => v.to_string(),
        GffValue::Double(v) => v.to_string(),
        GffValue::String(v) => v.clone(),
        GffValue::ResRef(v) => v.to_string(),
        GffValue::Binary(v) => BASE64.encode(v),
        GffValue::Struct(child) => return write_struct(writer, child, Some(label)),
        GffValue::List(list) => {
            if list.is_empty() {
                writer.write_event(Event::Empty(start))?;
                return Ok(());
            }
            writer.write_event(Event::Start(start.borrow()))?;
            for child in list {
                write_struct(writer, child, None)?;
            }
            writer.write_event(Event::End(BytesEnd::new(name)))?;
            return Ok(());
        }
        GffValue::LocalizedString(locstring) => {
            start.push_attribute(("strref", locstring.stringref.to_string().as_str()));
            if locstring.is_empty() {
                writer.write_event(Event::Empty(start))?;
                return Ok(());
            }
            writer.write_event(Event::Start(start.borrow()))?;
            for (id, text) in locstring.iter_ids() {
                let mut substring = BytesStart::new("string");
                substring.push_attribute(("language", (id / 2).to_string().as_str()));
                substring.push_attribute(("gender", (id % 2).to_string().as_str()));
                write_leaf(writer, substring, text)?;
            }
            writer.write_event(Event::End(BytesEnd::new(name)))?;
            return Ok(());
        }
        GffValue::Vector3(v) => return write_components(writer, start, &v.to_array()),
        GffValue::Vector4(v) => return write_components(writer, start, &v.to_array()),
    };

    write_leaf(writer, start, &text)
}

/// An element holding only text. Empty text becomes a self-closing element.
fn write_leaf<W: Write>(writer: &mut Writer<W>, start: BytesStart<'_>, text: &str) -> Result<()> {
    if text.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    let end = BytesEnd::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    writer.write_event(Event::Start(start.borrow()))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

fn write_components<W: Write>(
    writer: &mut Writer<W>,
    start: BytesStart<'_>,
    components: &[f32],
) -> Result<()> {
    let end = BytesEnd::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    writer.write_event(Event::Start(start.borrow()))?;
    for component in components {
        write_leaf(writer, BytesStart::new("double"), &component.to_string())?;
    }
    writer.write_event(Event::End(end))?;
    Ok(())
}
