//! GFF XML reading
//!
//! The root element's name is not checked; its `type` attribute supplies the
//! content tag and defaults to `GFF ` when missing.

use crate::error::{Error, Result};
use crate::formats::common::{LocalizedString, ResRef};
use crate::formats::gff::document::{Gff, GffList, GffStruct, GffValue};
use crate::formats::gff::types::{GffContent, GffFieldType};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use glam::{Vec3, Vec4};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Read a GFF XML file from disk
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid GFF XML.
pub fn read_gff_xml<P: AsRef<Path>>(path: P) -> Result<Gff> {
    let content = fs::read_to_string(path)?;
    parse_gff_xml(&content)
}

/// Parse a GFF from an XML string
///
/// # Errors
/// Returns an error if the XML is malformed or does not describe a GFF tree.
pub fn parse_gff_xml(content: &str) -> Result<Gff> {
    let mut reader = Reader::from_str(content);
    // Leaf text is significant, including surrounding whitespace.
    reader.trim_text(false);

    let mut parser = GffXmlParser::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => parser.open(&e)?,
            Event::Empty(e) => {
                parser.open(&e)?;
                parser.close()?;
            }
            Event::End(_) => parser.close()?,
            Event::Text(e) => parser.text(&e.unescape()?)?,
            Event::CData(e) => parser.text(std::str::from_utf8(e.as_ref())?)?,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    parser.finish()
}

enum Frame {
    Document,
    Struct {
        label: Option<String>,
        value: GffStruct,
    },
    List {
        label: String,
        value: GffList,
    },
    LocString {
        label: String,
        value: LocalizedString,
    },
    Substring {
        id: u32,
        text: String,
    },
    Vector {
        label: String,
        field_type: GffFieldType,
        components: Vec<f32>,
    },
    Component {
        text: String,
    },
    Leaf {
        label: String,
        field_type: GffFieldType,
        text: String,
    },
}

#[derive(Default)]
struct GffXmlParser {
    stack: Vec<Frame>,
    content: Option<GffContent>,
    root: Option<GffStruct>,
}

impl GffXmlParser {
    fn open(&mut self, e: &BytesStart<'_>) -> Result<()> {
        let name = std::str::from_utf8(e.name().as_ref())?.to_string();

        let Some(parent) = self.stack.last() else {
            if self.content.is_some() {
                return Err(Error::InvalidGffXml(format!("unexpected second root element <{name}>")));
            }
            let tag = attribute(e, "type")?.unwrap_or_else(|| "GFF ".to_string());
            self.content = Some(GffContent::from_tag(&tag));
            self.stack.push(Frame::Document);
            return Ok(());
        };

        let frame = match (parent, name.as_str()) {
            (Frame::LocString { .. }, "string") => {
                let language: u32 = parse_attribute(e, "language")?.unwrap_or(0);
                let gender: u32 = parse_attribute(e, "gender")?.unwrap_or(0);
                let id = language
                    .checked_mul(2)
                    .and_then(|id| id.checked_add(gender & 1))
                    .ok_or_else(|| Error::XmlAttrError(format!("language {language} is out of range")))?;
                Frame::Substring {
                    id,
                    text: String::new(),
                }
            }
            (Frame::Vector { .. }, "double") => Frame::Component {
                text: String::new(),
            },
            (Frame::Document | Frame::List { .. }, "struct") => Frame::Struct {
                label: None,
                value: GffStruct::new(parse_attribute(e, "id")?.unwrap_or(0)),
            },
            (Frame::Struct { .. }, _) => {
                let field_type = GffFieldType::from_xml_name(&name)
                    .ok_or_else(|| Error::InvalidGffXml(format!("unknown field element <{name}>")))?;
                let label = attribute(e, "label")?.ok_or_else(|| {
                    Error::InvalidGffXml(format!("<{name}> field is missing its label"))
                })?;
                match field_type {
                    GffFieldType::Struct => Frame::Struct {
                        label: Some(label),
                        value: GffStruct::new(parse_attribute(e, "id")?.unwrap_or(0)),
                    },
                    GffFieldType::List => Frame::List {
                        label,
                        value: GffList::new(),
                    },
                    GffFieldType::LocalizedString => Frame::LocString {
                        label,
                        value: LocalizedString::new(parse_attribute(e, "strref")?.unwrap_or(-1)),
                    },
                    GffFieldType::Vector3 | GffFieldType::Vector4 => Frame::Vector {
                        label,
                        field_type,
                        components: Vec::with_capacity(4),
                    },
                    _ => Frame::Leaf {
                        label,
                        field_type,
                        text: String::new(),
                    },
                }
            }
            _ => return Err(Error::InvalidGffXml(format!("unexpected element <{name}>"))),
        };
        self.stack.push(frame);
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        match self.stack.last_mut() {
            Some(
                Frame::Leaf { text: buffer, .. }
                | Frame::Substring { text: buffer, .. }
                | Frame::Component { text: buffer },
            ) => {
                buffer.push_str(text);
                Ok(())
            }
            _ if text.trim().is_empty() => Ok(()),
            _ => Err(Error::InvalidGffXml(format!("unexpected text '{}'", text.trim()))),
        }
    }

    fn close(&mut self) -> Result<()> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| Error::InvalidGffXml("unbalanced closing element".to_string()))?;

        match frame {
            Frame::Document => Ok(()),
            Frame::Struct { label, value } => match self.stack.last_mut() {
                Some(Frame::Document) => {
                    if self.root.replace(value).is_some() {
                        return Err(Error::InvalidGffXml("more than one root struct".to_string()));
                    }
                    Ok(())
                }
                Some(Frame::List { value: list, .. }) => {
                    list.push(value);
                    Ok(())
                }
                _ => match label {
                    Some(label) => self.attach(label, GffValue::Struct(value)),
                    None => Err(Error::InvalidGffXml("struct outside of a list".to_string())),
                },
            },
            Frame::List { label, value } => self.attach(label, GffValue::List(value)),
            Frame::LocString { label, value } => self.attach(label, GffValue::LocalizedString(value)),
            Frame::Substring { id, text } => match self.stack.last_mut() {
                Some(Frame::LocString { value, .. }) => {
                    value.set_by_id(id, text);
                    Ok(())
                }
                _ => Err(Error::InvalidGffXml("<string> outside of a locstring".to_string())),
            },
            Frame::Component { text } => match self.stack.last_mut() {
                Some(Frame::Vector { components, .. }) => {
                    components.push(parse_number(&text, "double")?);
                    Ok(())
                }
                _ => Err(Error::InvalidGffXml("<double> outside of a vector".to_string())),
            },
            Frame::Vector {
                label,
                field_type,
                components,
            } => {
                let value = match (field_type, components.as_slice()) {
                    (GffFieldType::Vector3, &[x, y, z]) => GffValue::Vector3(Vec3::new(x, y, z)),
                    (GffFieldType::Vector4, &[x, y, z, w]) => GffValue::Vector4(Vec4::new(x, y, z, w)),
                    _ => {
                        return Err(Error::InvalidGffXml(format!(
                            "<{}> '{label}' has {} components",
                            field_type.xml_name(),
                            components.len()
                        )));
                    }
                };
                self.attach(label, value)
            }
            Frame::Leaf {
                label,
                field_type,
                text,
            } => {
                let value = leaf_value(field_type, &text)?;
                self.attach(label, value)
            }
        }
    }

    fn attach(&mut self, label: String, value: GffValue) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::Struct { value: parent, .. }) => {
                parent.set(label, value);
                Ok(())
            }
            _ => Err(Error::InvalidGffXml(format!("field '{label}' outside of a struct"))),
        }
    }

    fn finish(self) -> Result<Gff> {
        if !self.stack.is_empty() {
            return Err(Error::InvalidGffXml("unclosed elements at end of document".to_string()));
        }
        let root = self
            .root
            .ok_or_else(|| Error::InvalidGffXml("missing root struct".to_string()))?;
        Ok(Gff {
            content: self.content.unwrap_or_default(),
            root,
        })
    }
}

fn leaf_value(field_type: GffFieldType, text: &str) -> Result<GffValue> {
    let name = field_type.xml_name();
    Ok(match field_type {
        GffFieldType::UInt8 => GffValue::UInt8(parse_number(text, name)?),
        GffFieldType::Int8 => GffValue::Int8(parse_number(text, name)?),
        GffFieldType::UInt16 => GffValue::UInt16(parse_number(text, name)?),
        GffFieldType::Int16 => GffValue::Int16(parse_number(text, name)?),
        GffFieldType::UInt32 => GffValue::UInt32(parse_number(text, name)?),
        GffFieldType::Int32 => GffValue::Int32(parse_number(text, name)?),
        GffFieldType::UInt64 => GffValue::UInt64(parse_number(text, name)?),
        GffFieldType::Int64 => GffValue::Int64(parse_number(text, name)?),
        GffFieldType::Single => GffValue::Single(parse_number(text, name)?),
        GffFieldType::Double => GffValue::Double(parse_number(text, name)?),
        GffFieldType::String => GffValue::String(text.to_string()),
        GffFieldType::ResRef => GffValue::ResRef(ResRef::new(text)),
        GffFieldType::Binary => GffValue::Binary(BASE64.decode(text.trim())?),
        GffFieldType::Struct
        | GffFieldType::List
        | GffFieldType::LocalizedString
        | GffFieldType::Vector3
        | GffFieldType::Vector4 => {
            return Err(Error::InvalidGffXml(format!("<{name}> cannot hold text")));
        }
    })
}

fn parse_number<T: FromStr>(text: &str, name: &str) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| Error::InvalidGffXml(format!("invalid <{name}> value '{text}'")))
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn parse_attribute<T: FromStr>(e: &BytesStart<'_>, key: &str) -> Result<Option<T>> {
    attribute(e, key)?
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| Error::InvalidGffXml(format!("invalid {key} attribute '{value}'")))
        })
        .transpose()
}
