//! Encoding [`DsonValue`] trees.
//!
//! [`write_value`] drives any [`DsonWriter`], so one value can be written as
//! text or binary. [`to_value`] turns any `Serialize` type into a
//! [`DsonValue`] first:
//!
//! ```rust
//! use dson::{to_value, DsonValue};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Point { x: i32, y: i32 }
//!
//! let value = to_value(&Point { x: 1, y: 2 }).unwrap();
//! let point = value.as_object().unwrap();
//! assert_eq!(point.fields.get("x"), Some(&DsonValue::Int32(1)));
//! ```

use serde::{ser, Serialize};
use tracing::trace;

use crate::error::{Error, Result};
use crate::map::DsonMap;
use crate::types::WireType;
use crate::value::{Binary, DsonArray, DsonObject, DsonValue};
use crate::writer::DsonWriter;

/// Writes one value at the writer's current position.
///
/// Integers use `wire_type`; container class ids and headers are written as
/// carried by the value.
pub fn write_value<W>(writer: &mut W, value: &DsonValue<W::Name>, wire_type: WireType) -> Result<()>
where
    W: DsonWriter + ?Sized,
{
    match value {
        DsonValue::Int32(v) => writer.write_int32(*v, wire_type),
        DsonValue::Int64(v) => writer.write_int64(*v, wire_type),
        DsonValue::Float(v) => writer.write_float(*v),
        DsonValue::Double(v) => writer.write_double(*v),
        DsonValue::Bool(v) => writer.write_bool(*v),
        DsonValue::String(s) => writer.write_string(s),
        DsonValue::Null => writer.write_null(),
        DsonValue::Binary(b) => writer.write_binary(b),
        DsonValue::ExtInt32(e) => writer.write_ext_int32(e, wire_type),
        DsonValue::ExtInt64(e) => writer.write_ext_int64(e, wire_type),
        DsonValue::ExtString(e) => writer.write_ext_string(e),
        DsonValue::Reference(r) => writer.write_ref(r),
        DsonValue::Object(object) => {
            trace!(fields = object.fields.len(), "writing object");
            writer.write_start_object(object.class_id.as_ref())?;
            write_header(writer, &object.header, wire_type)?;
            for (name, field) in object.fields.iter() {
                writer.write_name(name.clone())?;
                write_value(writer, field, wire_type)?;
            }
            writer.write_end_object()
        }
        DsonValue::Array(array) => {
            trace!(elements = array.elements.len(), "writing array");
            writer.write_start_array(array.class_id.as_ref())?;
            write_header(writer, &array.header, wire_type)?;
            for element in &array.elements {
                write_value(writer, element, wire_type)?;
            }
            writer.write_end_array()
        }
    }
}

fn write_header<W>(writer: &mut W, header: &DsonMap<W::Name>, wire_type: WireType) -> Result<()>
where
    W: DsonWriter + ?Sized,
{
    if header.is_empty() {
        return Ok(());
    }
    writer.write_start_header()?;
    for (name, member) in header.iter() {
        writer.write_name(name.clone())?;
        write_value(writer, member, wire_type)?;
    }
    writer.write_end_header()
}

/// Writes a sequence of top-level values.
pub fn write_document<'v, W, I>(writer: &mut W, values: I, wire_type: WireType) -> Result<()>
where
    W: DsonWriter + ?Sized,
    W::Name: 'v,
    I: IntoIterator<Item = &'v DsonValue<W::Name>>,
{
    for value in values {
        write_value(writer, value, wire_type)?;
    }
    writer.flush()
}

/// Converts a `Serialize` value into a text-named [`DsonValue`].
///
/// Structs and maps become objects, sequences and tuples become arrays, enum
/// variants carrying data become single-field objects keyed by the variant
/// name, and byte slices become [`Binary`] with subtype 0.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<DsonValue> {
    value.serialize(ValueSerializer)
}

/// A serde `Serializer` producing [`DsonValue`].
pub struct ValueSerializer;

pub struct SerializeVec {
    elements: Vec<DsonValue>,
    variant: Option<&'static str>,
}

pub struct SerializeMap {
    fields: DsonMap,
    key: Option<String>,
    variant: Option<&'static str>,
}

fn wrap_variant(variant: Option<&'static str>, value: DsonValue) -> DsonValue {
    match variant {
        Some(name) => {
            let mut object = DsonObject::new();
            object.insert(name.to_string(), value);
            DsonValue::Object(object)
        }
        None => value,
    }
}

impl ser::Serializer for ValueSerializer {
    type Ok = DsonValue;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<DsonValue> {
        Ok(DsonValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<DsonValue> {
        Ok(DsonValue::Int32(i32::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<DsonValue> {
        Ok(DsonValue::Int32(i32::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<DsonValue> {
        Ok(DsonValue::Int32(v))
    }

    fn serialize_i64(self, v: i64) -> Result<DsonValue> {
        Ok(DsonValue::Int64(v))
    }

    fn serialize_u8(self, v: u8) -> Result<DsonValue> {
        Ok(DsonValue::Int32(i32::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<DsonValue> {
        Ok(DsonValue::Int32(i32::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<DsonValue> {
        Ok(DsonValue::Int64(i64::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<DsonValue> {
        match i64::try_from(v) {
            Ok(v) => Ok(DsonValue::Int64(v)),
            Err(_) => Ok(DsonValue::Double(v as f64)),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<DsonValue> {
        Ok(DsonValue::Float(v))
    }

    fn serialize_f64(self, v: f64) -> Result<DsonValue> {
        Ok(DsonValue::Double(v))
    }

    fn serialize_char(self, v: char) -> Result<DsonValue> {
        Ok(DsonValue::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<DsonValue> {
        Ok(DsonValue::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<DsonValue> {
        Ok(DsonValue::Binary(Binary::new(0, v)))
    }

    fn serialize_none(self) -> Result<DsonValue> {
        Ok(DsonValue::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<DsonValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<DsonValue> {
        Ok(DsonValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<DsonValue> {
        Ok(DsonValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<DsonValue> {
        Ok(DsonValue::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<DsonValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<DsonValue>
    where
        T: ?Sized + Serialize,
    {
        Ok(wrap_variant(Some(variant), to_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0), None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, Some(variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeMap> {
        Ok(SerializeMap::new(Some(variant)))
    }
}

impl SerializeVec {
    fn new(capacity: usize, variant: Option<&'static str>) -> Self {
        SerializeVec {
            elements: Vec::with_capacity(capacity),
            variant,
        }
    }

    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.elements.push(to_value(value)?);
        Ok(())
    }

    fn finish(self) -> DsonValue {
        wrap_variant(
            self.variant,
            DsonValue::Array(DsonArray::from(self.elements)),
        )
    }
}

impl SerializeMap {
    fn new(variant: Option<&'static str>) -> Self {
        SerializeMap {
            fields: DsonMap::new(),
            key: None,
            variant,
        }
    }

    fn finish(self) -> DsonValue {
        wrap_variant(self.variant, DsonValue::Object(DsonObject::from(self.fields)))
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = DsonValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<DsonValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = DsonValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<DsonValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = DsonValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<DsonValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = DsonValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<DsonValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = DsonValue;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.key = Some(match to_value(key)? {
            DsonValue::String(s) => s,
            DsonValue::Int32(v) => v.to_string(),
            DsonValue::Int64(v) => v.to_string(),
            DsonValue::Bool(v) => v.to_string(),
            other => {
                return Err(Error::custom(format!(
                    "map keys must be strings or integers, found {}",
                    other.dson_type()
                )))
            }
        });
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.fields.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<DsonValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = DsonValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.fields.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<DsonValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = DsonValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.fields.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<DsonValue> {
        Ok(self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DsonOptions;
    use crate::text_writer::TextWriter;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Item {
        id: u32,
        name: String,
        tags: Vec<&'static str>,
        score: Option<f64>,
    }

    #[derive(Serialize)]
    enum Shape {
        Unit,
        Circle(f32),
        Rect { w: i16, h: i16 },
    }

    #[test]
    fn test_struct_to_value() {
        let item = Item {
            id: 7,
            name: "bolt".into(),
            tags: vec!["a", "b"],
            score: None,
        };
        let value = to_value(&item).unwrap();
        let object = value.as_object().unwrap();
        let names: Vec<&String> = object.fields.keys().collect();
        assert_eq!(names, ["id", "name", "tags", "score"]);
        assert_eq!(object.fields.get("id"), Some(&DsonValue::Int64(7)));
        assert_eq!(object.fields.get("score"), Some(&DsonValue::Null));
        let tags = object.fields.get("tags").and_then(|t| t.as_array()).unwrap();
        assert_eq!(tags.elements.len(), 2);
    }

    #[test]
    fn test_enum_variants() {
        assert_eq!(to_value(&Shape::Unit).unwrap(), DsonValue::String("Unit".into()));
        let circle = to_value(&Shape::Circle(1.5)).unwrap();
        assert_eq!(
            circle.as_object().and_then(|o| o.fields.get("Circle")),
            Some(&DsonValue::Float(1.5))
        );
        let rect = to_value(&Shape::Rect { w: 2, h: 3 }).unwrap();
        let inner = rect
            .as_object()
            .and_then(|o| o.fields.get("Rect"))
            .and_then(|v| v.as_object())
            .unwrap();
        assert_eq!(inner.fields.get("h"), Some(&DsonValue::Int32(3)));
    }

    #[test]
    fn test_integer_map_keys() {
        let mut map = BTreeMap::new();
        map.insert(2, "two");
        map.insert(1, "one");
        let value = to_value(&map).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().fields.keys().collect();
        assert_eq!(keys, ["1", "2"]);
    }

    #[test]
    fn test_large_u64_becomes_double() {
        assert_eq!(to_value(&u64::MAX).unwrap(), DsonValue::Double(u64::MAX as f64));
        assert_eq!(to_value(&5u64).unwrap(), DsonValue::Int64(5));
    }

    #[test]
    fn test_write_value_with_header() {
        let mut object = DsonObject::new().with_class_id("Pair".to_string());
        object.header.insert("v".to_string(), DsonValue::Int32(2));
        object.insert("a".to_string(), DsonValue::Null);
        let mut writer = TextWriter::new(&DsonOptions::default());
        write_value(&mut writer, &DsonValue::Object(object), WireType::VarInt).unwrap();
        assert_eq!(
            writer.into_string().unwrap(),
            "-- @{clsName: Pair, v: 2}{a: null}"
        );
    }
}
