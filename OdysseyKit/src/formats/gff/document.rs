//! GFF document structure definitions

use super::types::{GffContent, GffFieldType};
use crate::formats::common::{LocalizedString, ResRef};
use glam::{Vec3, Vec4};
use indexmap::IndexMap;

/// A GFF document: a content tag plus the root struct.
#[derive(Debug, Clone, PartialEq)]
pub struct Gff {
    pub content: GffContent,
    pub root: GffStruct,
}

impl Gff {
    /// Creates a document with an empty root struct (id -1).
    #[must_use]
    pub fn new(content: GffContent) -> Self {
        Gff {
            content,
            root: GffStruct::new(-1),
        }
    }
}

impl Default for Gff {
    fn default() -> Self {
        Self::new(GffContent::Gff)
    }
}

/// A typed GFF field value.
#[derive(Debug, Clone, PartialEq)]
pub enum GffValue {
    UInt8(u8),
    Int8(i8),
    UInt16(u16),
    Int16(i16),
    UInt32(u32),
    Int32(i32),
    UInt64(u64),
    Int64(i64),
    Single(f32),
    Double(f64),
    String(String),
    ResRef(ResRef),
    LocalizedString(LocalizedString),
    Binary(Vec<u8>),
    Struct(GffStruct),
    List(GffList),
    Vector3(Vec3),
    Vector4(Vec4),
}

impl GffValue {
    #[must_use]
    pub fn field_type(&self) -> GffFieldType {
        match self {
            GffValue::UInt8(_) => GffFieldType::UInt8,
            GffValue::Int8(_) => GffFieldType::Int8,
            GffValue::UInt16(_) => GffFieldType::UInt16,
            GffValue::Int16(_) => GffFieldType::Int16,
            GffValue::UInt32(_) => GffFieldType::UInt32,
            GffValue::Int32(_) => GffFieldType::Int32,
            GffValue::UInt64(_) => GffFieldType::UInt64,
            GffValue::Int64(_) => GffFieldType::Int64,
            GffValue::Single(_) => GffFieldType::Single,
            GffValue::Double(_) => GffFieldType::Double,
            GffValue::String(_) => GffFieldType::String,
            GffValue::ResRef(_) => GffFieldType::ResRef,
            GffValue::LocalizedString(_) => GffFieldType::LocalizedString,
            GffValue::Binary(_) => GffFieldType::Binary,
            GffValue::Struct(_) => GffFieldType::Struct,
            GffValue::List(_) => GffFieldType::List,
            GffValue::Vector3(_) => GffFieldType::Vector3,
            GffValue::Vector4(_) => GffFieldType::Vector4,
        }
    }

    /// Any integer field widened to `i64`. `UInt64` values above `i64::MAX`
    /// have no representation and yield `None`.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            GffValue::UInt8(v) => Some(i64::from(v)),
            GffValue::Int8(v) => Some(i64::from(v)),
            GffValue::UInt16(v) => Some(i64::from(v)),
            GffValue::Int16(v) => Some(i64::from(v)),
            GffValue::UInt32(v) => Some(i64::from(v)),
            GffValue::Int32(v) => Some(i64::from(v)),
            GffValue::UInt64(v) => i64::try_from(v).ok(),
            GffValue::Int64(v) => Some(v),
            _ => None,
        }
    }
}

/// Conversion used by [`GffStruct::acquire`].
///
/// Integer targets accept any integer field whose value fits; float targets
/// accept `Single` and `Double`; everything else requires the matching type.
pub trait FromGffValue: Sized {
    fn from_gff_value(value: &GffValue) -> Option<Self>;
}

macro_rules! integer_from_gff {
    ($($ty:ty),*) => {
        $(
            impl FromGffValue for $ty {
                fn from_gff_value(value: &GffValue) -> Option<Self> {
                    match *value {
                        GffValue::UInt64(v) => <$ty>::try_from(v).ok(),
                        _ => value.as_integer().and_then(|v| <$ty>::try_from(v).ok()),
                    }
                }
            }
        )*
    };
}

integer_from_gff!(u8, i8, u16, i16, u32, i32, u64, i64);

impl FromGffValue for bool {
    fn from_gff_value(value: &GffValue) -> Option<Self> {
        match *value {
            GffValue::UInt64(v) => Some(v != 0),
            _ => value.as_integer().map(|v| v != 0),
        }
    }
}

impl FromGffValue for f32 {
    fn from_gff_value(value: &GffValue) -> Option<Self> {
        match *value {
            GffValue::Single(v) => Some(v),
            GffValue::Double(v) => Some(v as f32),
            _ => None,
        }
    }
}

impl FromGffValue for f64 {
    fn from_gff_value(value: &GffValue) -> Option<Self> {
        match *value {
            GffValue::Single(v) => Some(f64::from(v)),
            GffValue::Double(v) => Some(v),
            _ => None,
        }
    }
}

impl FromGffValue for String {
    fn from_gff_value(value: &GffValue) -> Option<Self> {
        match value {
            GffValue::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromGffValue for ResRef {
    fn from_gff_value(value: &GffValue) -> Option<Self> {
        match value {
            GffValue::ResRef(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromGffValue for LocalizedString {
    fn from_gff_value(value: &GffValue) -> Option<Self> {
        match value {
            GffValue::LocalizedString(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromGffValue for Vec<u8> {
    fn from_gff_value(value: &GffValue) -> Option<Self> {
        match value {
            GffValue::Binary(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromGffValue for Vec3 {
    fn from_gff_value(value: &GffValue) -> Option<Self> {
        match *value {
            GffValue::Vector3(v) => Some(v),
            _ => None,
        }
    }
}

impl FromGffValue for Vec4 {
    fn from_gff_value(value: &GffValue) -> Option<Self> {
        match *value {
            GffValue::Vector4(v) => Some(v),
            _ => None,
        }
    }
}

impl FromGffValue for GffStruct {
    fn from_gff_value(value: &GffValue) -> Option<Self> {
        match value {
            GffValue::Struct(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromGffValue for GffList {
    fn from_gff_value(value: &GffValue) -> Option<Self> {
        match value {
            GffValue::List(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// A GFF struct: an id plus labelled, typed fields in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GffStruct {
    pub struct_id: i32,
    fields: IndexMap<String, GffValue>,
}

impl GffStruct {
    #[must_use]
    pub fn new(struct_id: i32) -> Self {
        GffStruct {
            struct_id,
            fields: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn exists(&self, label: &str) -> bool {
        self.fields.contains_key(label)
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&GffValue> {
        self.fields.get(label)
    }

    pub fn get_mut(&mut self, label: &str) -> Option<&mut GffValue> {
        self.fields.get_mut(label)
    }

    #[must_use]
    pub fn field_type(&self, label: &str) -> Option<GffFieldType> {
        self.fields.get(label).map(GffValue::field_type)
    }

    /// Removes a field, keeping the order of the remaining ones.
    pub fn remove(&mut self, label: &str) -> Option<GffValue> {
        self.fields.shift_remove(label)
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &GffValue)> {
        self.fields.iter().map(|(label, value)| (label.as_str(), value))
    }

    /// Reads a field as `T`, falling back to `default` when the label is
    /// missing or holds an incompatible type. Never fails.
    #[must_use]
    pub fn acquire<T: FromGffValue>(&self, label: &str, default: T) -> T {
        self.fields
            .get(label)
            .and_then(T::from_gff_value)
            .unwrap_or(default)
    }

    /// Inserts or replaces a field. A replaced field keeps its position.
    pub fn set(&mut self, label: impl Into<String>, value: GffValue) {
        self.fields.insert(label.into(), value);
    }

    pub fn set_uint8(&mut self, label: impl Into<String>, value: u8) {
        self.set(label, GffValue::UInt8(value));
    }

    pub fn set_int8(&mut self, label: impl Into<String>, value: i8) {
        self.set(label, GffValue::Int8(value));
    }

    pub fn set_uint16(&mut self, label: impl Into<String>, value: u16) {
        self.set(label, GffValue::UInt16(value));
    }

    pub fn set_int16(&mut self, label: impl Into<String>, value: i16) {
        self.set(label, GffValue::Int16(value));
    }

    pub fn set_uint32(&mut self, label: impl Into<String>, value: u32) {
        self.set(label, GffValue::UInt32(value));
    }

    pub fn set_int32(&mut self, label: impl Into<String>, value: i32) {
        self.set(label, GffValue::Int32(value));
    }

    pub fn set_uint64(&mut self, label: impl Into<String>, value: u64) {
        self.set(label, GffValue::UInt64(value));
    }

    pub fn set_int64(&mut self, label: impl Into<String>, value: i64) {
        self.set(label, GffValue::Int64(value));
    }

    pub fn set_single(&mut self, label: impl Into<String>, value: f32) {
        self.set(label, GffValue::Single(value));
    }

    pub fn set_double(&mut self, label: impl Into<String>, value: f64) {
        self.set(label, GffValue::Double(value));
    }

    pub fn set_string(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.set(label, GffValue::String(value.into()));
    }

    pub fn set_resref(&mut self, label: impl Into<String>, value: impl Into<ResRef>) {
        self.set(label, GffValue::ResRef(value.into()));
    }

    pub fn set_locstring(&mut self, label: impl Into<String>, value: LocalizedString) {
        self.set(label, GffValue::LocalizedString(value));
    }

    pub fn set_binary(&mut self, label: impl Into<String>, value: Vec<u8>) {
        self.set(label, GffValue::Binary(value));
    }

    pub fn set_vector3(&mut self, label: impl Into<String>, value: Vec3) {
        self.set(label, GffValue::Vector3(value));
    }

    pub fn set_vector4(&mut self, label: impl Into<String>, value: Vec4) {
        self.set(label, GffValue::Vector4(value));
    }

    /// Stores a nested struct and returns it for population.
    pub fn set_struct(&mut self, label: impl Into<String>, value: GffStruct) -> &mut GffStruct {
        let label = label.into();
        self.fields.insert(label.clone(), GffValue::Struct(value));
        match self.fields.get_mut(&label) {
            Some(GffValue::Struct(inner)) => inner,
            _ => unreachable!("struct field was just inserted"),
        }
    }

    /// Stores a list and returns it for population.
    pub fn set_list(&mut self, label: impl Into<String>, value: GffList) -> &mut GffList {
        let label = label.into();
        self.fields.insert(label.clone(), GffValue::List(value));
        match self.fields.get_mut(&label) {
            Some(GffValue::List(inner)) => inner,
            _ => unreachable!("list field was just inserted"),
        }
    }

    #[must_use]
    pub fn get_struct(&self, label: &str) -> Option<&GffStruct> {
        match self.fields.get(label) {
            Some(GffValue::Struct(inner)) => Some(inner),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_list(&self, label: &str) -> Option<&GffList> {
        match self.fields.get(label) {
            Some(GffValue::List(inner)) => Some(inner),
            _ => None,
        }
    }

    pub fn get_list_mut(&mut self, label: &str) -> Option<&mut GffList> {
        match self.fields.get_mut(label) {
            Some(GffValue::List(inner)) => Some(inner),
            _ => None,
        }
    }
}

/// An ordered list of structs owned by a `List` field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GffList {
    structs: Vec<GffStruct>,
}

impl GffList {
    #[must_use]
    pub fn new() -> Self {
        GffList {
            structs: Vec::new(),
        }
    }

    /// Appends a new empty struct and returns it for population.
    pub fn add(&mut self, struct_id: i32) -> &mut GffStruct {
        self.structs.push(GffStruct::new(struct_id));
        let last = self.structs.len() - 1;
        &mut self.structs[last]
    }

    pub fn push(&mut self, value: GffStruct) {
        self.structs.push(value);
    }

    #[must_use]
    pub fn at(&self, index: usize) -> Option<&GffStruct> {
        self.structs.get(index)
    }

    pub fn at_mut(&mut self, index: usize) -> Option<&mut GffStruct> {
        self.structs.get_mut(index)
    }

    pub fn remove(&mut self, index: usize) -> Option<GffStruct> {
        (index < self.structs.len()).then(|| self.structs.remove(index))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.structs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GffStruct> {
        self.structs.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, GffStruct> {
        self.structs.iter_mut()
    }
}

impl<'a> IntoIterator for &'a GffList {
    type Item = &'a GffStruct;
    type IntoIter = std::slice::Iter<'a, GffStruct>;

    fn into_iter(self) -> Self::IntoIter {
        self.structs.iter()
    }
}

impl FromIterator<GffStruct> for GffList {
    fn from_iter<I: IntoIterator<Item = GffStruct>>(iter: I) -> Self {
        GffList {
            structs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_defaults_on_missing_and_mismatch() {
        let mut gff_struct = GffStruct::new(0);
        gff_struct.set_string("Name", "Bastila");
        gff_struct.set_uint8("Flag", 1);

        assert_eq!(gff_struct.acquire("Name", String::new()), "Bastila");
        assert_eq!(gff_struct.acquire("Missing", 7u32), 7);
        // Wrong type never errors, it falls back.
        assert_eq!(gff_struct.acquire("Name", 3i32), 3);
        assert_eq!(gff_struct.acquire("Flag", ResRef::blank()), ResRef::blank());
        // Integer fields widen and narrow when the value fits.
        assert_eq!(gff_struct.acquire("Flag", 0i32), 1);
        assert!(gff_struct.acquire("Flag", false));
    }

    #[test]
    fn test_acquire_rejects_out_of_range_integers() {
        let mut gff_struct = GffStruct::new(0);
        gff_struct.set_uint32("Delay", 0xFFFF_FFFF);
        assert_eq!(gff_struct.acquire("Delay", 5i32), 5);
        assert_eq!(gff_struct.acquire("Delay", 0u32), 0xFFFF_FFFF);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut gff_struct = GffStruct::new(-1);
        gff_struct.set_int32("A", 1);
        gff_struct.set_int32("B", 2);
        gff_struct.set_single("A", 1.5);

        let labels: Vec<&str> = gff_struct.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, ["A", "B"]);
        assert_eq!(gff_struct.field_type("A"), Some(GffFieldType::Single));
    }

    #[test]
    fn test_list_add_and_nested_access() {
        let mut root = GffStruct::new(-1);
        let list = root.set_list("Items", GffList::new());
        list.add(3).set_resref("Tag", "item01");
        list.add(4);

        let list = root.get_list("Items").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.at(0).unwrap().struct_id, 3);
        assert_eq!(list.at(0).unwrap().acquire("Tag", ResRef::blank()), "item01");
        assert!(list.at(2).is_none());
    }
}
