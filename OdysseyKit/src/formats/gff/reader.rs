//! GFF V3.2 binary reading
//!
//! Every section and offset is bounds checked; anything that points outside
//! the buffer surfaces as [`Error::CorruptFormat`] with the absolute offset.

use super::document::{Gff, GffList, GffStruct, GffValue};
use super::types::{GffContent, GffFieldType};
use crate::error::{Error, Result};
use crate::formats::common::{LocalizedString, ResRef, decode_text};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use encoding_rs::WINDOWS_1252;
use glam::{Vec3, Vec4};
use std::collections::HashSet;
use std::io::{Cursor, Read};
use std::path::Path;

pub(super) const HEADER_SIZE: usize = 56;
pub(super) const VERSION: &[u8; 4] = b"V3.2";
pub(super) const STRUCT_SIZE: usize = 12;
pub(super) const FIELD_SIZE: usize = 12;
pub(super) const LABEL_SIZE: usize = 16;
const FORMAT: &str = "GFF";

/// Read a binary GFF file from disk
///
/// # Errors
/// Returns an error if the file cannot be read or is not a valid GFF.
pub fn read_gff_binary<P: AsRef<Path>>(path: P) -> Result<Gff> {
    let data = std::fs::read(path)?;
    parse_gff_bytes(&data)
}

/// Parse a binary GFF from bytes
///
/// # Errors
/// Returns [`Error::CorruptFormat`] for truncated data, out-of-range offsets,
/// unknown field types or struct cycles.
pub fn parse_gff_bytes(data: &[u8]) -> Result<Gff> {
    if data.len() < HEADER_SIZE {
        return Err(Error::corrupt(
            FORMAT,
            data.len() as u64,
            format!("header needs {HEADER_SIZE} bytes, got {}", data.len()),
        ));
    }

    let mut cursor = Cursor::new(data);
    let mut tag = [0u8; 4];
    cursor.read_exact(&mut tag)?;
    let mut version = [0u8; 4];
    cursor.read_exact(&mut version)?;
    if &version != VERSION {
        tracing::warn!("Reading GFF with unexpected version {:?}", String::from_utf8_lossy(&version));
    }

    let mut pairs = [(0u32, 0u32); 6];
    for pair in &mut pairs {
        pair.0 = cursor.read_u32::<LittleEndian>()?;
        pair.1 = cursor.read_u32::<LittleEndian>()?;
    }
    let [structs, fields, labels, field_data, field_indices, list_indices] = pairs;

    if structs.1 == 0 {
        return Err(Error::corrupt(FORMAT, u64::from(structs.0), "missing root struct"));
    }

    let label_section =
        Section::slice(data, "label array", labels.0, u64::from(labels.1) * LABEL_SIZE as u64)?;
    let mut parser = GffParser {
        structs: Section::slice(data, "struct array", structs.0, u64::from(structs.1) * STRUCT_SIZE as u64)?,
        fields: Section::slice(data, "field array", fields.0, u64::from(fields.1) * FIELD_SIZE as u64)?,
        field_data: Section::slice(data, "field data", field_data.0, u64::from(field_data.1))?,
        field_indices: Section::slice(data, "field indices", field_indices.0, u64::from(field_indices.1))?,
        list_indices: Section::slice(data, "list indices", list_indices.0, u64::from(list_indices.1))?,
        labels: read_labels(&label_section),
        in_progress: HashSet::new(),
    };

    let content = GffContent::from_tag(&decode_text(&tag, WINDOWS_1252));
    tracing::debug!(
        "Parsing GFF '{}': {} structs, {} fields, {} labels",
        content,
        structs.1,
        fields.1,
        labels.1
    );

    let root = parser.read_struct(0)?;
    Ok(Gff { content, root })
}

fn read_labels(section: &Section<'_>) -> Vec<String> {
    section
        .bytes
        .chunks_exact(LABEL_SIZE)
        .map(|raw| decode_text(raw, WINDOWS_1252))
        .collect()
}

/// A bounds-checked view of one block of the file.
struct Section<'a> {
    name: &'static str,
    base: u64,
    bytes: &'a [u8],
}

impl<'a> Section<'a> {
    fn slice(data: &'a [u8], name: &'static str, offset: u32, size: u64) -> Result<Self> {
        let start = u64::from(offset);
        let end = start + size;
        if end > data.len() as u64 {
            return Err(Error::corrupt(
                FORMAT,
                start,
                format!("{name} ({size} bytes) runs past end of data ({} bytes)", data.len()),
            ));
        }
        Ok(Section {
            name,
            base: start,
            bytes: &data[start as usize..end as usize],
        })
    }

    fn bytes_at(&self, pos: u64, len: u64) -> Result<&'a [u8]> {
        let end = pos.saturating_add(len);
        if end > self.bytes.len() as u64 {
            return Err(Error::corrupt(
                FORMAT,
                self.base + pos,
                format!("read of {len} bytes overruns {} ({} bytes)", self.name, self.bytes.len()),
            ));
        }
        Ok(&self.bytes[pos as usize..end as usize])
    }

    fn u32_at(&self, pos: u64) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.bytes_at(pos, 4)?))
    }

    fn i32_at(&self, pos: u64) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.bytes_at(pos, 4)?))
    }

    fn u64_at(&self, pos: u64) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.bytes_at(pos, 8)?))
    }

    fn f32_at(&self, pos: u64) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.bytes_at(pos, 4)?))
    }

    /// A u32 length prefix followed by that many bytes.
    fn prefixed_at(&self, pos: u64) -> Result<&'a [u8]> {
        let len = self.u32_at(pos)?;
        self.bytes_at(pos + 4, u64::from(len))
    }
}

struct GffParser<'a> {
    structs: Section<'a>,
    fields: Section<'a>,
    field_data: Section<'a>,
    field_indices: Section<'a>,
    list_indices: Section<'a>,
    labels: Vec<String>,
    /// Structs on the current descent path, for cycle detection.
    in_progress: HashSet<u32>,
}

impl GffParser<'_> {
    fn read_struct(&mut self, index: u32) -> Result<GffStruct> {
        let pos = u64::from(index) * STRUCT_SIZE as u64;
        let struct_id = self.structs.i32_at(pos)?;
        let data_or_offset = self.structs.u32_at(pos + 4)?;
        let field_count = self.structs.u32_at(pos + 8)?;

        if !self.in_progress.insert(index) {
            return Err(Error::corrupt(
                FORMAT,
                self.structs.base + pos,
                format!("struct {index} contains itself"),
            ));
        }

        let mut gff_struct = GffStruct::new(struct_id);
        match field_count {
            0 => {}
            1 => self.read_field(data_or_offset, &mut gff_struct)?,
            count => {
                let base = u64::from(data_or_offset);
                for i in 0..u64::from(count) {
                    let field_index = self.field_indices.u32_at(base + i * 4)?;
                    self.read_field(field_index, &mut gff_struct)?;
                }
            }
        }

        self.in_progress.remove(&index);
        Ok(gff_struct)
    }

    fn read_field(&mut self, index: u32, target: &mut GffStruct) -> Result<()> {
        let pos = u64::from(index) * FIELD_SIZE as u64;
        let type_id = self.fields.u32_at(pos)?;
        let label_index = self.fields.u32_at(pos + 4)?;
        let data = self.fields.u32_at(pos + 8)?;

        let field_type = GffFieldType::from_id(type_id).ok_or_else(|| {
            Error::corrupt(FORMAT, self.fields.base + pos, format!("unknown field type {type_id}"))
        })?;
        let label = self
            .labels
            .get(label_index as usize)
            .cloned()
            .ok_or_else(|| {
                Error::corrupt(
                    FORMAT,
                    self.fields.base + pos + 4,
                    format!("label index {label_index} out of range ({} labels)", self.labels.len()),
                )
            })?;

        let value = self.read_value(field_type, data)?;
        target.set(label, value);
        Ok(())
    }

    fn read_value(&mut self, field_type: GffFieldType, data: u32) -> Result<GffValue> {
        let offset = u64::from(data);
        let value = match field_type {
            GffFieldType::UInt8 => GffValue::UInt8(data as u8),
            GffFieldType::Int8 => GffValue::Int8(data as u8 as i8),
            GffFieldType::UInt16 => GffValue::UInt16(data as u16),
            GffFieldType::Int16 => GffValue::Int16(data as u16 as i16),
            GffFieldType::UInt32 => GffValue::UInt32(data),
            GffFieldType::Int32 => GffValue::Int32(data as i32),
            GffFieldType::Single => GffValue::Single(f32::from_bits(data)),
            GffFieldType::UInt64 => GffValue::UInt64(self.field_data.u64_at(offset)?),
            GffFieldType::Int64 => GffValue::Int64(self.field_data.u64_at(offset)? as i64),
            GffFieldType::Double => {
                GffValue::Double(f64::from_bits(self.field_data.u64_at(offset)?))
            }
            GffFieldType::String => {
                let raw = self.field_data.prefixed_at(offset)?;
                GffValue::String(decode_text(raw, WINDOWS_1252))
            }
            GffFieldType::ResRef => {
                let raw = self.field_data.prefixed_at(offset)?;
                GffValue::ResRef(ResRef::new(decode_text(raw, WINDOWS_1252)))
            }
            GffFieldType::LocalizedString => {
                GffValue::LocalizedString(self.read_locstring(offset)?)
            }
            GffFieldType::Binary => {
                GffValue::Binary(self.field_data.prefixed_at(offset)?.to_vec())
            }
            GffFieldType::Vector3 => GffValue::Vector3(Vec3::new(
                self.field_data.f32_at(offset)?,
                self.field_data.f32_at(offset + 4)?,
                self.field_data.f32_at(offset + 8)?,
            )),
            GffFieldType::Vector4 => GffValue::Vector4(Vec4::new(
                self.field_data.f32_at(offset)?,
                self.field_data.f32_at(offset + 4)?,
                self.field_data.f32_at(offset + 8)?,
                self.field_data.f32_at(offset + 12)?,
            )),
            GffFieldType::Struct => GffValue::Struct(self.read_struct(data)?),
            GffFieldType::List => GffValue::List(self.read_list(offset)?),
        };
        Ok(value)
    }

    fn read_locstring(&self, offset: u64) -> Result<LocalizedString> {
        // Total size excludes the size word itself.
        let body = self.field_data.prefixed_at(offset)?;
        let body = Section {
            name: "localized string",
            base: self.field_data.base + offset + 4,
            bytes: body,
        };

        let mut locstring = LocalizedString::new(body.i32_at(0)?);
        let count = body.u32_at(4)?;
        let mut pos = 8;
        for _ in 0..count {
            let id = body.u32_at(pos)?;
            let raw = body.prefixed_at(pos + 4)?;
            let (language, _) = LocalizedString::split_substring_id(id);
            locstring.set_by_id(id, decode_text(raw, language.encoding()));
            pos += 8 + raw.len() as u64;
        }
        Ok(locstring)
    }

    fn read_list(&mut self, offset: u64) -> Result<GffList> {
        let count = self.list_indices.u32_at(offset)?;
        // Validate the whole index run before allocating for it.
        self.list_indices.bytes_at(offset + 4, u64::from(count) * 4)?;

        let mut list = GffList::new();
        for i in 0..u64::from(count) {
            let struct_index = self.list_indices.u32_at(offset + 4 + i * 4)?;
            list.push(self.read_struct(struct_index)?);
        }
        Ok(list)
    }
}
