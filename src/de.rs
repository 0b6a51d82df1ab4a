//! Decoding [`DsonValue`] trees.
//!
//! [`read_value`] pulls one value out of any [`DsonReader`], so the same code
//! decodes text and binary. [`from_value`] then maps a text-named value onto
//! any `Deserialize` type:
//!
//! ```rust
//! use dson::{from_text, from_value};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Data { x: i32, y: i64 }
//!
//! let value = from_text("-- {x: 1, y: 2}").unwrap();
//! let data: Data = from_value(value).unwrap();
//! assert_eq!(data, Data { x: 1, y: 2 });
//! ```
//!
//! Class ids and header members are kept on the decoded [`DsonObject`] and
//! [`DsonArray`] but are invisible to `from_value`, which sees only fields and
//! elements.

use serde::de::{self, DeserializeOwned};
use serde::forward_to_deserialize_any;
use tracing::trace;

use crate::error::{Error, Result};
use crate::map::DsonMap;
use crate::reader::DsonReader;
use crate::ser::to_value;
use crate::types::{DsonName, DsonType};
use crate::value::{DsonArray, DsonObject, DsonValue};

/// Reads the value whose type `read_dson_type` just returned as `ty`.
///
/// Inside an object the caller reads the name first.
pub fn read_value<R>(reader: &mut R, ty: DsonType) -> Result<DsonValue<R::Name>>
where
    R: DsonReader + ?Sized,
{
    Ok(match ty {
        DsonType::Int32 => DsonValue::Int32(reader.read_int32()?),
        DsonType::Int64 => DsonValue::Int64(reader.read_int64()?),
        DsonType::Float => DsonValue::Float(reader.read_float()?),
        DsonType::Double => DsonValue::Double(reader.read_double()?),
        DsonType::Boolean => DsonValue::Bool(reader.read_bool()?),
        DsonType::String => DsonValue::String(reader.read_string()?),
        DsonType::Null => {
            reader.read_null()?;
            DsonValue::Null
        }
        DsonType::Binary => DsonValue::Binary(reader.read_binary()?),
        DsonType::ExtString => DsonValue::ExtString(reader.read_ext_string()?),
        DsonType::ExtInt32 => DsonValue::ExtInt32(reader.read_ext_int32()?),
        DsonType::ExtInt64 => DsonValue::ExtInt64(reader.read_ext_int64()?),
        DsonType::Reference => DsonValue::Reference(reader.read_ref()?),
        DsonType::Object => DsonValue::Object(read_object(reader)?),
        DsonType::Array => DsonValue::Array(read_array(reader)?),
        DsonType::Header | DsonType::EndOfObject => {
            return Err(Error::protocol(format!("{} is not a value", ty)))
        }
    })
}

/// Reads every remaining top-level value.
pub fn read_document<R>(reader: &mut R) -> Result<Vec<DsonValue<R::Name>>>
where
    R: DsonReader + ?Sized,
{
    let mut values = Vec::new();
    loop {
        match reader.read_dson_type()? {
            DsonType::EndOfObject => return Ok(values),
            ty => values.push(read_value(reader, ty)?),
        }
    }
}

fn read_object<R>(reader: &mut R) -> Result<DsonObject<R::Name>>
where
    R: DsonReader + ?Sized,
{
    let mut object = DsonObject::new();
    object.class_id = reader.class_id().cloned();
    reader.read_start_object()?;
    trace!(depth = reader.depth(), "reading object");
    loop {
        match reader.read_dson_type()? {
            DsonType::EndOfObject => break,
            DsonType::Header => read_header(reader, &mut object.class_id, &mut object.header)?,
            ty => {
                let name = reader.read_name()?;
                let value = read_value(reader, ty)?;
                object.fields.insert(name, value);
            }
        }
    }
    reader.read_end_object()?;
    Ok(object)
}

fn read_array<R>(reader: &mut R) -> Result<DsonArray<R::Name>>
where
    R: DsonReader + ?Sized,
{
    let mut array = DsonArray::new();
    array.class_id = reader.class_id().cloned();
    reader.read_start_array()?;
    trace!(depth = reader.depth(), "reading array");
    loop {
        match reader.read_dson_type()? {
            DsonType::EndOfObject => break,
            DsonType::Header => read_header(reader, &mut array.class_id, &mut array.header)?,
            ty => array.elements.push(read_value(reader, ty)?),
        }
    }
    reader.read_end_array()?;
    Ok(array)
}

/// Reads a header member. A member restating the class id is folded into it.
fn read_header<R>(
    reader: &mut R,
    class_id: &mut Option<<R::Name as DsonName>::ClassId>,
    header: &mut DsonMap<R::Name>,
) -> Result<()>
where
    R: DsonReader + ?Sized,
{
    reader.read_start_header()?;
    loop {
        let ty = reader.read_dson_type()?;
        if ty == DsonType::EndOfObject {
            break;
        }
        let name = reader.read_name()?;
        let value = read_value(reader, ty)?;
        match R::Name::class_id_from_header(&name, &value) {
            Some(id) => {
                class_id.get_or_insert(id);
            }
            None => {
                header.insert(name, value);
            }
        }
    }
    reader.read_end_header()
}

/// Maps a text-named [`DsonValue`] onto a `Deserialize` type.
///
/// Extension values and references are presented in their serde data form,
/// the same shape `serde_json` shows for them.
pub fn from_value<T: DeserializeOwned>(value: DsonValue) -> Result<T> {
    T::deserialize(ValueDeserializer::new(value))
}

/// A serde `Deserializer` over an owned [`DsonValue`].
pub struct ValueDeserializer {
    value: DsonValue,
}

impl ValueDeserializer {
    pub fn new(value: DsonValue) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            DsonValue::Null => visitor.visit_unit(),
            DsonValue::Bool(b) => visitor.visit_bool(b),
            DsonValue::Int32(v) => visitor.visit_i32(v),
            DsonValue::Int64(v) => visitor.visit_i64(v),
            DsonValue::Float(v) => visitor.visit_f32(v),
            DsonValue::Double(v) => visitor.visit_f64(v),
            DsonValue::String(s) => visitor.visit_string(s),
            DsonValue::Array(array) => visitor.visit_seq(SeqDeserializer::new(array.elements)),
            DsonValue::Object(object) => visitor.visit_map(MapDeserializer::new(object.fields)),
            DsonValue::Binary(b) => ValueDeserializer::new(to_value(&b)?).deserialize_any(visitor),
            DsonValue::ExtInt32(e) => ValueDeserializer::new(to_value(&e)?).deserialize_any(visitor),
            DsonValue::ExtInt64(e) => ValueDeserializer::new(to_value(&e)?).deserialize_any(visitor),
            DsonValue::ExtString(e) => ValueDeserializer::new(to_value(&e)?).deserialize_any(visitor),
            DsonValue::Reference(r) => ValueDeserializer::new(to_value(&r)?).deserialize_any(visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            DsonValue::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            DsonValue::Binary(b) => visitor.visit_byte_buf(b.data),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            DsonValue::String(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
            }),
            DsonValue::Object(object) if object.fields.len() == 1 => {
                let (variant, value) = object
                    .fields
                    .into_iter()
                    .next()
                    .ok_or_else(|| Error::custom("empty enum object"))?;
                visitor.visit_enum(EnumDeserializer {
                    variant,
                    value: Some(value),
                })
            }
            other => Err(Error::type_mismatch("enum", other.dson_type())),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        unit unit_struct seq tuple tuple_struct map struct identifier ignored_any
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<DsonValue>,
}

impl SeqDeserializer {
    fn new(elements: Vec<DsonValue>) -> Self {
        SeqDeserializer {
            iter: elements.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, DsonValue>,
    value: Option<DsonValue>,
}

impl MapDeserializer {
    fn new(fields: DsonMap) -> Self {
        MapDeserializer {
            iter: fields.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(DsonValue::String(key)))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<DsonValue>,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, VariantDeserializer)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ValueDeserializer::new(DsonValue::String(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<DsonValue>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Some(DsonValue::Null) | None => Ok(()),
            Some(other) => Err(Error::type_mismatch("unit variant", other.dson_type())),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("expected newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(DsonValue::Array(array)) => visitor.visit_seq(SeqDeserializer::new(array.elements)),
            _ => Err(Error::custom("expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(DsonValue::Object(object)) => visitor.visit_map(MapDeserializer::new(object.fields)),
            _ => Err(Error::custom("expected struct variant")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary_reader::BinaryReader;
    use crate::options::DsonOptions;
    use crate::text_reader::TextReader;
    use crate::types::{ClassId, FieldNumber};
    use serde::Deserialize;
    use std::collections::HashMap;

    fn text(input: &str) -> Vec<DsonValue> {
        let mut reader = TextReader::new(input, &DsonOptions::default());
        read_document(&mut reader).unwrap()
    }

    #[test]
    fn test_fields_in_order() {
        let values = text("-- {x: 1, y: 2}");
        let object = values[0].as_object().unwrap();
        let pairs: Vec<(&String, &DsonValue)> = object.fields.iter().collect();
        assert_eq!(pairs[0], (&"x".to_string(), &DsonValue::Int32(1)));
        assert_eq!(pairs[1], (&"y".to_string(), &DsonValue::Int32(2)));
        assert_eq!(object.class_id, None);
    }

    #[test]
    fn test_class_name_folded_out_of_header() {
        let values = text("-- @{clsName: Pair, v: 2}[1, 2]\n-- @Point{x: 1}");
        let pair = values[0].as_array().unwrap();
        assert_eq!(pair.class_id.as_deref(), Some("Pair"));
        assert_eq!(pair.header.len(), 1);
        assert_eq!(pair.header.get("v"), Some(&DsonValue::Int32(2)));
        assert_eq!(pair.elements.len(), 2);

        let point = values[1].as_object().unwrap();
        assert_eq!(point.class_id.as_deref(), Some("Point"));
        assert!(point.header.is_empty());
    }

    #[test]
    fn test_binary_document() {
        let bytes = [
            104, 8, 0, 0, 0, // object, len 8
            1, 3, 1, 0, 0, 0, // class id 3:1
            48, 8, // null, field 1
            120,
        ];
        let mut reader = BinaryReader::new(&bytes, &DsonOptions::default());
        let values = read_document(&mut reader).unwrap();
        let object = values[0].as_object().unwrap();
        assert_eq!(object.class_id, Some(ClassId::new(3, 1)));
        assert_eq!(object.fields.get(&FieldNumber::of(1)), Some(&DsonValue::Null));
    }

    #[test]
    fn test_header_value_at_top_level_rejected() {
        let mut reader = TextReader::new("-- 1", &DsonOptions::default());
        reader.read_dson_type().unwrap();
        assert!(read_value(&mut reader, DsonType::Header).is_err());
    }

    #[derive(Deserialize, Debug, PartialEq)]
    enum Event {
        Stop,
        Move { dx: i32 },
        Say(String),
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Record {
        id: u64,
        label: Option<String>,
        ratio: f32,
        events: Vec<Event>,
        extra: HashMap<String, bool>,
    }

    #[test]
    fn test_from_value_struct() {
        let value = text(
            "-- {id: 9, label: null, ratio: @f 0.25, events: [Stop, {Move: {dx: -1}}, {Say: hi}], extra: {on: true}}",
        )
        .remove(0);
        let record: Record = from_value(value).unwrap();
        assert_eq!(record.id, 9);
        assert_eq!(record.label, None);
        assert_eq!(record.ratio, 0.25);
        assert_eq!(
            record.events,
            vec![Event::Stop, Event::Move { dx: -1 }, Event::Say("hi".into())]
        );
        assert_eq!(record.extra.get("on"), Some(&true));
    }

    #[test]
    fn test_from_value_type_error() {
        let value = DsonValue::String("x".into());
        assert!(from_value::<i32>(value).is_err());
    }
}
