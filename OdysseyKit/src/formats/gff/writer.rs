//! GFF V3.2 binary writing

use super::document::{Gff, GffStruct, GffValue};
use super::reader::{FIELD_SIZE, HEADER_SIZE, LABEL_SIZE, STRUCT_SIZE, VERSION};
use crate::error::{Error, Result};
use crate::formats::common::{LocalizedString, ResRef, encode_text};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use encoding_rs::WINDOWS_1252;
use std::collections::HashMap;
use std::path::Path;

/// Write a GFF to disk in binary form
///
/// # Errors
/// Returns an error if serialization or file writing fails.
pub fn write_gff_binary<P: AsRef<Path>>(gff: &Gff, path: P) -> Result<()> {
    let bytes = serialize_gff(gff)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Serialize a GFF to its binary form
///
/// Structs are numbered in depth-first pre-order with the root at 0.
///
/// # Errors
/// Returns [`Error::InvalidLabel`] if a field label exceeds 16 bytes.
pub fn serialize_gff(gff: &Gff) -> Result<Vec<u8>> {
    let mut builder = GffBuilder::default();
    builder.add_struct(&gff.root)?;

    tracing::debug!(
        "Serialized GFF '{}': {} structs, {} fields, {} labels",
        gff.content,
        builder.structs.len(),
        builder.fields.len(),
        builder.labels.len()
    );

    builder.finish(&gff.content.tag())
}

struct StructEntry {
    struct_id: i32,
    data_or_offset: u32,
    field_count: u32,
}

struct FieldEntry {
    type_id: u32,
    label_index: u32,
    data_or_offset: u32,
}

#[derive(Default)]
struct GffBuilder {
    structs: Vec<StructEntry>,
    fields: Vec<FieldEntry>,
    labels: Vec<[u8; LABEL_SIZE]>,
    label_lookup: HashMap<String, u32>,
    field_data: Vec<u8>,
    field_indices: Vec<u8>,
    list_indices: Vec<u8>,
}

impl GffBuilder {
    fn add_struct(&mut self, gff_struct: &GffStruct) -> Result<u32> {
        let index = self.structs.len() as u32;
        self.structs.push(StructEntry {
            struct_id: gff_struct.struct_id,
            data_or_offset: 0,
            field_count: gff_struct.len() as u32,
        });

        // Children claim their own field slots while recursing, so this
        // struct's field indices are only contiguous once collected.
        let mut field_ids = Vec::with_capacity(gff_struct.len());
        for (label, value) in gff_struct.iter() {
            field_ids.push(self.add_field(label, value)?);
        }

        let data_or_offset = match field_ids.as_slice() {
            [] => u32::MAX,
            [single] => *single,
            many => {
                let offset = self.field_indices.len() as u32;
                for id in many {
                    self.field_indices.write_u32::<LittleEndian>(*id)?;
                }
                offset
            }
        };
        self.structs[index as usize].data_or_offset = data_or_offset;
        Ok(index)
    }

    fn add_field(&mut self, label: &str, value: &GffValue) -> Result<u32> {
        let label_index = self.label(label)?;
        let index = self.fields.len() as u32;
        self.fields.push(FieldEntry {
            type_id: value.field_type().id(),
            label_index,
            data_or_offset: 0,
        });

        let data_or_offset = self.value_data(value)?;
        self.fields[index as usize].data_or_offset = data_or_offset;
        Ok(index)
    }

    fn label(&mut self, label: &str) -> Result<u32> {
        if let Some(&index) = self.label_lookup.get(label) {
            return Ok(index);
        }
        let encoded = encode_text(label, WINDOWS_1252)?;
        if encoded.len() > LABEL_SIZE {
            return Err(Error::InvalidLabel {
                label: label.to_string(),
            });
        }
        let mut raw = [0u8; LABEL_SIZE];
        raw[..encoded.len()].copy_from_slice(&encoded);

        let index = self.labels.len() as u32;
        self.labels.push(raw);
        self.label_lookup.insert(label.to_string(), index);
        Ok(index)
    }

    /// The 4-byte slot of a field: the value itself, a field data offset, a
    /// struct index or a list indices offset.
    fn value_data(&mut self, value: &GffValue) -> Result<u32> {
        let offset = self.field_data.len() as u32;
        let slot = match value {
            GffValue::UInt8(v) => u32::from(*v),
            GffValue::Int8(v) => u32::from(*v as u8),
            GffValue::UInt16(v) => u32::from(*v),
            GffValue::Int16(v) => u32::from(*v as u16),
            GffValue::UInt32(v) => *v,
            GffValue::Int32(v) => *v as u32,
            GffValue::Single(v) => v.to_bits(),
            GffValue::UInt64(v) => {
                self.field_data.write_u64::<LittleEndian>(*v)?;
                offset
            }
            GffValue::Int64(v) => {
                self.field_data.write_i64::<LittleEndian>(*v)?;
                offset
            }
            GffValue::Double(v) => {
                self.field_data.write_f64::<LittleEndian>(*v)?;
                offset
            }
            GffValue::String(v) => {
                let encoded = encode_text(v, WINDOWS_1252)?;
                self.field_data.write_u32::<LittleEndian>(encoded.len() as u32)?;
                self.field_data.extend_from_slice(&encoded);
                offset
            }
            GffValue::ResRef(v) => {
                write_resref(&mut self.field_data, v)?;
                offset
            }
            GffValue::LocalizedString(v) => {
                write_locstring(&mut self.field_data, v)?;
                offset
            }
            GffValue::Binary(v) => {
                self.field_data.write_u32::<LittleEndian>(v.len() as u32)?;
                self.field_data.extend_from_slice(v);
                offset
            }
            GffValue::Vector3(v) => {
                for component in v.to_array() {
                    self.field_data.write_f32::<LittleEndian>(component)?;
                }
                offset
            }
            GffValue::Vector4(v) => {
                for component in v.to_array() {
                    self.field_data.write_f32::<LittleEndian>(component)?;
                }
                offset
            }
            GffValue::Struct(child) => self.add_struct(child)?,
            GffValue::List(list) => {
                let list_offset = self.list_indices.len();
                self.list_indices.write_u32::<LittleEndian>(list.len() as u32)?;
                // Reserve the index run before recursing; nested lists append
                // after it.
                self.list_indices.resize(list_offset + 4 + list.len() * 4, 0);
                for (i, child) in list.iter().enumerate() {
                    let struct_index = self.add_struct(child)?;
                    let pos = list_offset + 4 + i * 4;
                    LittleEndian::write_u32(&mut self.list_indices[pos..pos + 4], struct_index);
                }
                list_offset as u32
            }
        };
        Ok(slot)
    }

    fn finish(self, tag: &str) -> Result<Vec<u8>> {
        let struct_offset = HEADER_SIZE;
        let field_offset = struct_offset + self.structs.len() * STRUCT_SIZE;
        let label_offset = field_offset + self.fields.len() * FIELD_SIZE;
        let field_data_offset = label_offset + self.labels.len() * LABEL_SIZE;
        let field_indices_offset = field_data_offset + self.field_data.len();
        let list_indices_offset = field_indices_offset + self.field_indices.len();
        let total = list_indices_offset + self.list_indices.len();

        let mut output = Vec::with_capacity(total);
        let mut raw_tag = [b' '; 4];
        for (slot, byte) in raw_tag.iter_mut().zip(tag.bytes()) {
            *slot = byte;
        }
        output.extend_from_slice(&raw_tag);
        output.extend_from_slice(VERSION);

        for (offset, count) in [
            (struct_offset, self.structs.len()),
            (field_offset, self.fields.len()),
            (label_offset, self.labels.len()),
            (field_data_offset, self.field_data.len()),
            (field_indices_offset, self.field_indices.len()),
            (list_indices_offset, self.list_indices.len()),
        ] {
            output.write_u32::<LittleEndian>(offset as u32)?;
            output.write_u32::<LittleEndian>(count as u32)?;
        }

        for entry in &self.structs {
            output.write_i32::<LittleEndian>(entry.struct_id)?;
            output.write_u32::<LittleEndian>(entry.data_or_offset)?;
            output.write_u32::<LittleEndian>(entry.field_count)?;
        }
        for entry in &self.fields {
            output.write_u32::<LittleEndian>(entry.type_id)?;
            output.write_u32::<LittleEndian>(entry.label_index)?;
            output.write_u32::<LittleEndian>(entry.data_or_offset)?;
        }
        for label in &self.labels {
            output.extend_from_slice(label);
        }
        output.extend_from_slice(&self.field_data);
        output.extend_from_slice(&self.field_indices);
        output.extend_from_slice(&self.list_indices);

        Ok(output)
    }
}

fn write_resref(data: &mut Vec<u8>, resref: &ResRef) -> Result<()> {
    let mut encoded = encode_text(resref.truncated(), WINDOWS_1252)?;
    encoded.truncate(ResRef::MAX_LENGTH);
    data.write_u32::<LittleEndian>(encoded.len() as u32)?;
    data.extend_from_slice(&encoded);
    Ok(())
}

fn write_locstring(data: &mut Vec<u8>, locstring: &LocalizedString) -> Result<()> {
    let mut body = Vec::new();
    body.write_i32::<LittleEndian>(locstring.stringref)?;
    body.write_u32::<LittleEndian>(locstring.len() as u32)?;
    for (id, text) in locstring.iter_ids() {
        let (language, _) = LocalizedString::split_substring_id(id);
        let encoded = encode_text(text, language.encoding())?;
        body.write_u32::<LittleEndian>(id)?;
        body.write_u32::<LittleEndian>(encoded.len() as u32)?;
        body.extend_from_slice(&encoded);
    }
    data.write_u32::<LittleEndian>(body.len() as u32)?;
    data.extend_from_slice(&body);
    Ok(())
}
